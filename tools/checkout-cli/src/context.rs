//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use checkout_engine::CheckoutEngine;
use checkout_store::{MemoryStore, OrderStore, RestStore};

use crate::config::{Backend, CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Engine bound to whichever store the config names.
pub type Engine = CheckoutEngine<dyn OrderStore>;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Directory the config file was found in.
    pub root: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, root) = if let Some(path) = config_path {
            let root = Path::new(path)
                .parent()
                .map(|p| cwd.join(p))
                .unwrap_or_else(|| cwd.clone());
            (CliConfig::load(path)?, root)
        } else {
            // Try to find config in current directory or parent directories
            Self::find_config(&cwd).unwrap_or_else(|| (CliConfig::default(), cwd.clone()))
        };

        Ok(Self {
            config,
            output,
            cwd,
            root,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, current));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the config file's directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        }
    }

    /// Open the configured store and build an engine over it.
    pub async fn connect(&self) -> Result<Connection> {
        let engine_config = self.config.engine_config()?;

        match self.config.store.backend {
            Backend::Memory => {
                let path = self.resolve_path(&self.config.store.snapshot);
                self.output.debug(&format!("Loading snapshot {}", path.display()));
                let store = MemoryStore::load(&path)
                    .await
                    .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;
                let store = Arc::new(store);
                let engine = CheckoutEngine::with_config(store.clone() as Arc<dyn OrderStore>, engine_config);
                Ok(Connection {
                    engine,
                    snapshot: Some((store, path)),
                })
            }
            Backend::Rest => {
                let base_url = &self.config.store.base_url;
                self.output.debug(&format!("Using json-server at {}", base_url));
                let store = RestStore::new(base_url.as_str(), self.config.store.timeout())
                    .with_context(|| format!("Failed to build HTTP client for {}", base_url))?;
                let engine = CheckoutEngine::with_config(Arc::new(store) as Arc<dyn OrderStore>, engine_config);
                Ok(Connection {
                    engine,
                    snapshot: None,
                })
            }
        }
    }
}

/// An open store connection.
pub struct Connection {
    /// The checkout engine.
    pub engine: Engine,
    snapshot: Option<(Arc<MemoryStore>, PathBuf)>,
}

impl Connection {
    /// Write the snapshot back if the memory backend saw any writes.
    pub async fn persist(&self) -> Result<()> {
        let Some((store, path)) = &self.snapshot else {
            return Ok(());
        };
        if !store.has_written().await {
            return Ok(());
        }
        store
            .save(path)
            .await
            .with_context(|| format!("Failed to save snapshot: {}", path.display()))
    }
}
