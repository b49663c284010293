//! The main Rhai scripting engine for Sylva
//!
//! Provides the `sylva` namespace:
//! - `sylva::config::*` - configuration and settings
//! - `sylva::widgets::*` - widget overrides

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use rhai::{Engine, Scope};
use tracing::{debug, info};

use super::api;
use crate::config::{ConfigError, Settings};

/// Where the current settings came from, so they can be rebuilt
#[derive(Debug, Clone)]
enum Loaded {
    File(PathBuf),
    Script(String),
}

/// The main scripting engine for Sylva
pub struct ScriptEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
    loaded: Vec<Loaded>,
}

impl ScriptEngine {
    /// Create a new script engine with fresh settings
    pub fn new() -> Self {
        let settings = Arc::new(RwLock::new(Settings::default()));
        let engine = Self::create_engine(Arc::clone(&settings));

        Self {
            engine,
            settings,
            loaded: Vec::new(),
        }
    }

    /// Create the Rhai engine with the `sylva` namespace
    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        let mut sylva_module = rhai::Module::new();
        sylva_module.set_sub_module("config", api::config::create_module(Arc::clone(&settings)));
        sylva_module.set_sub_module("widgets", api::widgets::create_module(settings));

        // Register `sylva` as a static module (accessible as sylva::*)
        engine.register_static_module("sylva", sylva_module.into());

        engine.on_print(|msg| info!(target: "config", "{}", msg));
        engine.on_debug(|msg, _, pos| debug!(target: "config", "{} at {}", msg, pos));

        engine
    }

    /// Load and execute a config file
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.run_file(path)?;
        self.loaded.push(Loaded::File(path.to_path_buf()));
        Ok(())
    }

    /// Evaluate a Rhai script string
    pub fn eval(&mut self, script: &str) -> Result<(), ConfigError> {
        self.run(script)?;
        self.loaded.push(Loaded::Script(script.to_string()));
        Ok(())
    }

    fn run_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "config", path = %path.display(), "evaluating config");
        self.run(&content)
    }

    fn run(&self, script: &str) -> Result<(), ConfigError> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| ConfigError::Compile(e.to_string()))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ConfigError::Eval(e.to_string()))
    }

    /// Rebuild settings from defaults by re-running everything loaded so far
    ///
    /// Files are read again, so edits made since the last load take effect.
    pub fn reload(&mut self) -> Result<Settings, ConfigError> {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = Settings::default();
        for loaded in &self.loaded {
            match loaded {
                Loaded::File(path) => self.run_file(path)?,
                Loaded::Script(script) => self.run(script)?,
            }
        }
        info!(target: "config", sources = self.loaded.len(), "config reloaded");
        Ok(self.settings())
    }

    /// Get the current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get the config directory path
    /// Uses ~/.config/sylva/ on all platforms for consistency
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("sylva"))
    }

    /// Get the default config file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("init.rhai"))
    }

    /// Load the default config file if it exists
    pub fn load_default(&mut self) -> Result<(), ConfigError> {
        if let Some(config_file) = Self::config_file() {
            if config_file.exists() {
                return self.load_file(&config_file);
            }
        }
        Ok(()) // No config file is fine
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}
