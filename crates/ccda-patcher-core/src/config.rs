//! Patcher configuration.
//!
//! Resolved once at startup and passed to [`crate::handlers::HandlerChain::standard`], so
//! handlers never read the process environment while a save is in flight.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handlers::Operation;
use crate::patch::LocatorStrategy;

pub const DB_PATH_VAR: &str = "CCDA_PATCHER_DB";
pub const LOCATOR_VAR: &str = "CCDA_PATCHER_LOCATOR";
pub const HANDLERS_VAR: &str = "CCDA_PATCHER_HANDLERS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatcherConfig {
    /// SQLite database, `None` for an in-memory store
    pub db_path: Option<PathBuf>,
    /// How sections are recognised
    pub locator: LocatorStrategy,
    /// Handlers to register; always run in canonical order
    pub handlers: Vec<Operation>,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            locator: LocatorStrategy::default(),
            handlers: Operation::ALL.to_vec(),
        }
    }
}

impl PatcherConfig {
    pub fn new(db_path: Option<PathBuf>, locator: LocatorStrategy, handlers: Vec<Operation>) -> Self {
        Self {
            db_path,
            locator,
            handlers,
        }
    }

    /// Load `.env` if present, then read the `CCDA_PATCHER_*` variables.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup. Unset or blank variables keep their defaults.
    pub fn from_vars<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(DB_PATH_VAR) {
            config.db_path = Some(PathBuf::from(path.trim()));
        }

        if let Some(locator) = get(LOCATOR_VAR) {
            config.locator = locator.parse().map_err(|message| ConfigError::InvalidValue {
                var: LOCATOR_VAR,
                message,
            })?;
        }

        if let Some(list) = get(HANDLERS_VAR) {
            config.handlers = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::parse::<Operation>)
                .collect::<Result<Vec<Operation>, String>>()
                .map_err(|message| ConfigError::InvalidValue {
                    var: HANDLERS_VAR,
                    message,
                })?;
        }

        Ok(config)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn is_enabled(&self, operation: Operation) -> bool {
        self.handlers.contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ConfigResult<PatcherConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PatcherConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_enable_everything() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, PatcherConfig::default());
        assert!(Operation::ALL.iter().all(|op| config.is_enabled(*op)));
        assert_eq!(config.db_path(), None);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            (DB_PATH_VAR, "/var/lib/openemr/patcher.db"),
            (LOCATOR_VAR, "template-id"),
            (HANDLERS_VAR, "birth-sex, repairs"),
        ])
        .unwrap();

        assert_eq!(config.db_path(), Some(Path::new("/var/lib/openemr/patcher.db")));
        assert_eq!(config.locator, LocatorStrategy::TemplateId);
        assert!(config.is_enabled(Operation::BirthSex));
        assert!(!config.is_enabled(Operation::Encounters));
    }

    #[test]
    fn test_blank_variables_keep_defaults() {
        let config = config_from(&[(LOCATOR_VAR, " "), (HANDLERS_VAR, "")]).unwrap();
        assert_eq!(config, PatcherConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from(&[(LOCATOR_VAR, "xpath")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: LOCATOR_VAR, .. }));

        let err = config_from(&[(HANDLERS_VAR, "birth-sex,smoking")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid CCDA_PATCHER_HANDLERS: unknown handler: smoking");
    }
}
