//! Action handler configuration and registry.
//!
//! An action handler owns the side effect of an event type (send an email,
//! update a field). This crate never runs the side effect itself; it routes
//! each executed event onto the handler's queue for a downstream consumer.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct ActionConfig {
    action: ActionMeta,
}

/// A registered action handler.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionMeta {
    /// Event action type this handler serves (e.g. "email.send").
    pub name: String,

    /// Queue that executed events of this type are delivered on.
    pub queue: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Registry of action handlers, indexed by action type.
pub struct ActionRegistry {
    actions: HashMap<String, ActionMeta>,
}

impl ActionRegistry {
    /// Create an empty registry with no handlers.
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Load all `.toml` files from a directory and build the registry.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut actions = HashMap::new();

        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Config(format!("cannot read actions dir {}: {e}", dir.display())))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)?;
                let config: ActionConfig = toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("bad action config {}: {e}", path.display()))
                })?;
                let meta = config.action;
                actions.insert(meta.name.clone(), meta);
            }
        }

        Ok(Self { actions })
    }

    /// Look up a handler by action type.
    pub fn get(&self, name: &str) -> Option<&ActionMeta> {
        self.actions.get(name)
    }

    /// Iterate over all registered handlers.
    pub fn iter(&self) -> impl Iterator<Item = &ActionMeta> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
