//! Language registry for Tree-sitter grammars
//!
//! Grammars are either registered in-process or loaded dynamically from shared
//! libraries named `tree-sitter-<grammar>` exporting `tree_sitter_<grammar>`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use libloading::{Library, Symbol};
use serde::{Serialize, Serializer};
use tracing::{debug, error, info};

use super::error::{Result, SyntaxError};
use super::fields::FieldTable;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    JavaScript,
    Json,
    Markdown,
    MarkdownInline,
    Rust,
    Python,
    Toml,
    Bash,
    C,
    Go,
    Yaml,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "json" => Language::Json,
            "md" | "markdown" => Language::Markdown,
            "rs" => Language::Rust,
            "py" | "pyw" | "pyi" => Language::Python,
            "toml" => Language::Toml,
            "sh" | "bash" | "zsh" => Language::Bash,
            "c" | "h" => Language::C,
            "go" => Language::Go,
            "yaml" | "yml" => Language::Yaml,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Look up a language by grammar name or display name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|lang| {
                lang.grammar_name() == Some(wanted.as_str()) || lang.name().to_lowercase() == wanted
            })
            .or(match wanted.as_str() {
                "js" => Some(Language::JavaScript),
                "md" => Some(Language::Markdown),
                "markdown_inline" => Some(Language::MarkdownInline),
                _ => None,
            })
    }

    /// Get the display name for this language
    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Json => "JSON",
            Language::Markdown => "Markdown",
            Language::MarkdownInline => "Markdown (inline)",
            Language::Rust => "Rust",
            Language::Python => "Python",
            Language::Toml => "TOML",
            Language::Bash => "Bash",
            Language::C => "C",
            Language::Go => "Go",
            Language::Yaml => "YAML",
            Language::Unknown => "Plain Text",
        }
    }

    /// Get the grammar name (used for library loading)
    pub fn grammar_name(&self) -> Option<&'static str> {
        match self {
            Language::JavaScript => Some("javascript"),
            Language::Json => Some("json"),
            Language::Markdown => Some("markdown"),
            Language::MarkdownInline => Some("markdown-inline"),
            Language::Rust => Some("rust"),
            Language::Python => Some("python"),
            Language::Toml => Some("toml"),
            Language::Bash => Some("bash"),
            Language::C => Some("c"),
            Language::Go => Some("go"),
            Language::Yaml => Some("yaml"),
            Language::Unknown => None,
        }
    }

    /// Name of the exported function returning the grammar definition
    pub fn symbol_name(&self) -> Option<String> {
        self.grammar_name()
            .map(|name| format!("tree_sitter_{}", name.replace('-', "_")))
    }

    /// All languages that have a grammar
    pub fn all() -> Vec<Language> {
        vec![
            Language::JavaScript,
            Language::Json,
            Language::Markdown,
            Language::MarkdownInline,
            Language::Rust,
            Language::Python,
            Language::Toml,
            Language::Bash,
            Language::C,
            Language::Go,
            Language::Yaml,
        ]
    }
}

// Serialized by grammar name, which is what the tree viewer shows
impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.grammar_name().unwrap_or("text"))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved grammar: the definition, its field table, and the library it came from
struct Grammar {
    id: Language,
    language: tree_sitter::Language,
    fields: FieldTable,
    // Declared last so the library outlives everything pointing into it
    library: Option<Library>,
}

/// Cheap, shareable reference to a resolved grammar
#[derive(Clone)]
pub struct GrammarHandle {
    inner: Arc<Grammar>,
}

impl GrammarHandle {
    fn new(id: Language, language: tree_sitter::Language, library: Option<Library>) -> Self {
        let fields = FieldTable::new(&language);
        Self {
            inner: Arc::new(Grammar {
                id,
                language,
                fields,
                library,
            }),
        }
    }

    pub fn id(&self) -> Language {
        self.inner.id
    }

    pub fn language(&self) -> &tree_sitter::Language {
        &self.inner.language
    }

    pub fn fields(&self) -> &FieldTable {
        &self.inner.fields
    }

    pub fn is_dynamic(&self) -> bool {
        self.inner.library.is_some()
    }
}

impl fmt::Debug for GrammarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarHandle")
            .field("id", &self.inner.id)
            .field("fields", &self.inner.fields.len())
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

/// Registry of available Tree-sitter languages
///
/// Lookups take `&self` and are safe from several threads. A language is
/// materialized at most once; later resolutions are map lookups, and a failed
/// load is remembered so it is not retried on every call.
pub struct GrammarRegistry {
    grammars_dir: PathBuf,
    loaded: RwLock<HashMap<Language, GrammarHandle>>,
    failed: RwLock<HashMap<Language, SyntaxError>>,
}

impl GrammarRegistry {
    /// Create a registry that loads libraries from `grammars_dir`
    pub fn new(grammars_dir: impl Into<PathBuf>) -> Self {
        Self {
            grammars_dir: grammars_dir.into(),
            loaded: RwLock::new(HashMap::new()),
            failed: RwLock::new(HashMap::new()),
        }
    }

    /// Default grammars directory, `~/.config/sylva/grammars`
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".config").join("sylva").join("grammars"))
            .unwrap_or_else(|| PathBuf::from("grammars"))
    }

    /// Get the grammars directory path
    pub fn grammars_dir(&self) -> &Path {
        &self.grammars_dir
    }

    /// Get the library path for a grammar inside the grammars directory
    pub fn library_path(&self, lang: Language) -> Option<PathBuf> {
        let name = lang.grammar_name()?;
        Some(
            self.grammars_dir
                .join(libloading::library_filename(format!("tree-sitter-{}", name))),
        )
    }

    /// Register an in-process grammar, replacing any previous entry
    pub fn register(
        &self,
        lang: Language,
        language: tree_sitter::Language,
    ) -> Result<GrammarHandle> {
        check_abi(lang, &language)?;
        let handle = GrammarHandle::new(lang, language, None);
        write(&self.failed).remove(&lang);
        write(&self.loaded).insert(lang, handle.clone());
        debug!(target: "syntax", language = %lang, "registered static grammar");
        Ok(handle)
    }

    /// Resolve a grammar, loading its library on first use
    pub fn resolve(&self, lang: Language) -> Result<GrammarHandle> {
        if let Some(handle) = read(&self.loaded).get(&lang) {
            return Ok(handle.clone());
        }
        if let Some(err) = read(&self.failed).get(&lang) {
            return Err(err.clone());
        }

        let mut loaded = write(&self.loaded);
        // Another caller may have loaded it while we waited for the lock
        if let Some(handle) = loaded.get(&lang) {
            return Ok(handle.clone());
        }

        match self.load(lang) {
            Ok(handle) => {
                info!(target: "syntax", language = %lang, "loaded grammar");
                loaded.insert(lang, handle.clone());
                Ok(handle)
            }
            Err(err) => {
                write(&self.failed).insert(lang, err.clone());
                Err(err)
            }
        }
    }

    /// Resolve several languages up front, reporting every failure
    pub fn preload(&self, langs: &[Language]) -> Vec<SyntaxError> {
        langs
            .iter()
            .filter_map(|lang| match self.resolve(*lang) {
                Ok(_) => None,
                Err(err) => {
                    error!(target: "syntax", language = %lang, "{}", err);
                    Some(err)
                }
            })
            .collect()
    }

    /// Check whether a grammar has been resolved successfully
    pub fn is_loaded(&self, lang: Language) -> bool {
        read(&self.loaded).contains_key(&lang)
    }

    /// Languages resolved so far, in a stable order
    pub fn loaded_languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = read(&self.loaded).keys().copied().collect();
        langs.sort();
        langs
    }

    /// A registry over `grammars_dir` that keeps this one's in-process grammars
    ///
    /// Libraries loaded from the old directory are not carried over.
    pub fn relocated(&self, grammars_dir: impl Into<PathBuf>) -> Self {
        let registry = Self::new(grammars_dir);
        let statics: HashMap<Language, GrammarHandle> = read(&self.loaded)
            .iter()
            .filter(|(_, handle)| !handle.is_dynamic())
            .map(|(lang, handle)| (*lang, handle.clone()))
            .collect();
        *write(&registry.loaded) = statics;
        registry
    }

    /// Forget cached failures so the next resolution retries the load
    pub fn clear_failures(&self) {
        write(&self.failed).clear();
    }

    fn load(&self, lang: Language) -> Result<GrammarHandle> {
        let not_found = |reason: String| SyntaxError::GrammarNotFound {
            language: lang,
            reason,
        };

        let name = lang
            .grammar_name()
            .ok_or_else(|| not_found("language has no grammar".to_string()))?;
        let symbol = lang
            .symbol_name()
            .ok_or_else(|| not_found("language has no grammar".to_string()))?;

        let file = libloading::library_filename(format!("tree-sitter-{}", name));
        let candidates = [self.grammars_dir.join(&file), PathBuf::from(&file)];

        let mut last_error = String::new();
        for path in &candidates {
            // Safety: grammar libraries have no initialisation side effects
            let library = match unsafe { Library::new(path) } {
                Ok(library) => library,
                Err(e) => {
                    debug!(target: "syntax", path = %path.display(), "library not loaded: {}", e);
                    last_error = e.to_string();
                    continue;
                }
            };

            let language = unsafe {
                let func: Symbol<unsafe extern "C" fn() -> tree_sitter::Language> = library
                    .get(symbol.as_bytes())
                    .map_err(|e| {
                        not_found(format!(
                            "symbol {} missing from {}: {}",
                            symbol,
                            path.display(),
                            e
                        ))
                    })?;
                func()
            };

            check_abi(lang, &language)?;
            return Ok(GrammarHandle::new(lang, language, Some(library)));
        }

        Err(not_found(format!(
            "could not load {}: {}",
            file.to_string_lossy(),
            last_error
        )))
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

fn check_abi(lang: Language, language: &tree_sitter::Language) -> Result<()> {
    let version = language.version();
    let min = tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION;
    let max = tree_sitter::LANGUAGE_VERSION;
    if (min..=max).contains(&version) {
        Ok(())
    } else {
        Err(SyntaxError::IncompatibleGrammar {
            language: lang,
            version,
            min,
            max,
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
