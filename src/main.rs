use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::error;
use tracing_subscriber::EnvFilter;

use sylva::pipeline::{Pipeline, run_checks};
use sylva::playground::{self, App, Buffer};
use sylva::render::terminal::{layout, print_lines};
use sylva::render::format_tree;
use sylva::scripting::ScriptEngine;
use sylva::syntax::{InlineLayer, Language, Node};

const USAGE: &str = "\
usage: sylva <command> [options]

commands:
  ast <file> [--lang <name>] [--json]   print the syntax tree
  markdown <file> [--json] [--inline]   render a Markdown file
  playground [file] [--lang <name>]     interactive split view
  check                                 parse known inputs and verify the result
  languages                             list languages and grammar status
";

/// `--json` output is written recursively, so very deep trees are refused
const MAX_JSON_DEPTH: u32 = 1024;

/// Parsed command line flags after the command name
#[derive(Debug, Default)]
struct Args {
    file: Option<PathBuf>,
    lang: Option<Language>,
    json: bool,
    inline: bool,
}

impl Args {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "--inline" => parsed.inline = true,
                "--lang" => {
                    let name = iter.next().context("--lang needs a language name")?;
                    let lang = Language::from_name(name)
                        .with_context(|| format!("unknown language: {}", name))?;
                    parsed.lang = Some(lang);
                }
                flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
                file if parsed.file.is_none() => parsed.file = Some(PathBuf::from(file)),
                extra => bail!("unexpected argument: {}", extra),
            }
        }
        Ok(parsed)
    }

    fn file(&self) -> anyhow::Result<&Path> {
        self.file.as_deref().context("missing <file> argument")
    }

    /// Explicit `--lang`, else detected from the file name
    fn language(&self) -> Language {
        self.lang.unwrap_or_else(|| {
            self.file
                .as_deref()
                .map(Language::from_path)
                .unwrap_or(Language::Markdown)
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("SYLVA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        print!("{}", USAGE);
        return Ok(());
    };

    let mut scripts = ScriptEngine::new();
    if let Err(err) = scripts.load_default() {
        // A broken config should not lock the user out
        error!(target: "config", "{}", err);
        eprintln!("sylva: config not applied: {}", err);
    }
    let mut pipeline = Pipeline::new(scripts.settings());

    match command.as_str() {
        "ast" => ast(&mut pipeline, &Args::parse(rest)?),
        "markdown" => markdown(&mut pipeline, &Args::parse(rest)?),
        "playground" => {
            preload(&pipeline);
            let args = Args::parse(rest)?;
            let buffer = match &args.file {
                Some(path) if path.exists() => Buffer::from_file(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                _ => Buffer::new(),
            };
            let app = App::new(buffer, args.language(), pipeline, scripts);
            playground::run(app).await.context("terminal error")
        }
        "check" => check(&mut pipeline),
        "languages" => languages(&pipeline),
        "help" | "--help" | "-h" => {
            print!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command: {}\n\n{}", other, USAGE),
    }
}

/// Resolve the configured grammars up front, reporting each failure
fn preload(pipeline: &Pipeline) {
    for err in pipeline.preload() {
        eprintln!("sylva: {}", err);
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn ast(pipeline: &mut Pipeline, args: &Args) -> anyhow::Result<()> {
    let path = args.file()?;
    let source = read_source(path)?;
    let language = args.language();
    let root = pipeline
        .syntax_tree(language, &source)
        .with_context(|| format!("parsing {} as {}", path.display(), language))?;

    if args.json {
        check_json_depth(&root)?;
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", format_tree(&root, pipeline.settings().show_anonymous));
    }
    Ok(())
}

fn check_json_depth(root: &Node) -> anyhow::Result<()> {
    let deepest = root.descendants().map(|node| node.depth).max().unwrap_or(0);
    if deepest > MAX_JSON_DEPTH {
        bail!(
            "tree is {} levels deep, too deep for --json (limit {})",
            deepest,
            MAX_JSON_DEPTH
        );
    }
    Ok(())
}

fn markdown(pipeline: &mut Pipeline, args: &Args) -> anyhow::Result<()> {
    let path = args.file()?;
    let source = read_source(path)?;
    let view = pipeline
        .render_markdown(&source)
        .with_context(|| format!("rendering {}", path.display()))?;

    if let InlineLayer::Rejected(err) = &view.layered.inline {
        eprintln!("sylva: inline pass skipped: {}", err);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view.unit)?);
    } else {
        let theme = pipeline.theme();
        let lines = layout(&view.unit, pipeline.settings().wrap_width, theme);
        let mut stdout = io::stdout().lock();
        print_lines(&mut stdout, &lines, theme)?;
    }

    if args.inline {
        if let Some(inline) = view.layered.inline.tree() {
            println!("{}", format_tree(inline, pipeline.settings().show_anonymous));
        }
    }
    Ok(())
}

fn check(pipeline: &mut Pipeline) -> anyhow::Result<()> {
    let checks = run_checks(pipeline);
    let mut stdout = io::stdout().lock();
    for check in &checks {
        match &check.outcome {
            Ok(()) => writeln!(stdout, "ok    {}", check.name)?,
            Err(reason) => writeln!(stdout, "FAIL  {}: {}", check.name, reason)?,
        }
    }
    let failed = checks.iter().filter(|c| !c.passed()).count();
    if failed > 0 {
        bail!("{} of {} checks failed", failed, checks.len());
    }
    Ok(())
}

fn languages(pipeline: &Pipeline) -> anyhow::Result<()> {
    let grammars = pipeline.grammars();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "grammars: {}", grammars.grammars_dir().display())?;
    for language in Language::all() {
        let status = match grammars.resolve(language) {
            Ok(handle) if handle.is_dynamic() => "loaded".to_string(),
            Ok(_) => "built in".to_string(),
            Err(err) => err.to_string(),
        };
        writeln!(
            stdout,
            "{:<20} {:<16} {}",
            language.grammar_name().unwrap_or("-"),
            language.name(),
            status
        )?;
    }
    Ok(())
}
