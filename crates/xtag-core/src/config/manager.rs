use std::{
    path::PathBuf,
    sync::{Arc, RwLock},
};

use xtag_proto::config::{Config, ConfigValidationError};

/// Represents the effect a configuration update has on the running page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigImpact {
    /// Whether the element list changed.
    pub elements_changed: bool,
    /// Whether window title or dimensions changed.
    pub page_changed: bool,
    /// Whether appearance settings changed.
    pub appearance_changed: bool,
    /// Whether the typesetting engine settings changed.
    pub typeset_changed: bool,
    /// Whether the log level changed.
    pub log_level_changed: bool,
}

impl ConfigImpact {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Applied configuration along with its computed impact.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigApplied {
    /// The fully validated configuration that was applied.
    pub config: Arc<Config>,
    /// The impact of applying the configuration.
    pub impact: ConfigImpact,
}

/// Describes failures that occurred while attempting to refresh the
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdateError {
    /// Reading the configuration file from disk failed.
    Read { path: PathBuf, context: String },
    /// Parsing TOML content failed.
    Parse { path: PathBuf, context: String },
    /// Validation detected a logical inconsistency.
    Validation(ConfigValidationError),
    /// The configuration file was removed.
    Removed,
    /// Updating the configuration state failed for an internal reason.
    State { context: String },
}

impl std::fmt::Display for ConfigUpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, context } => {
                write!(f, "failed to read config at {:?}: {}", path, context)
            }
            Self::Parse { path, context } => {
                write!(f, "failed to parse config at {:?}: {}", path, context)
            }
            Self::Validation(err) => write!(f, "{}", err),
            Self::Removed => write!(f, "configuration file removed"),
            Self::State { context } => {
                write!(f, "failed to update configuration state: {}", context)
            }
        }
    }
}

impl std::error::Error for ConfigUpdateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigValidationError> for ConfigUpdateError {
    fn from(err: ConfigValidationError) -> Self {
        Self::Validation(err)
    }
}

impl ConfigUpdateError {
    pub fn read(path: PathBuf, err: &std::io::Error) -> Self {
        Self::Read {
            path,
            context: err.to_string(),
        }
    }

    pub fn parse(path: PathBuf, err: &toml::de::Error) -> Self {
        Self::Parse {
            path,
            context: err.to_string(),
        }
    }

    pub fn state(context: impl Into<String>) -> Self {
        Self::State {
            context: context.into(),
        }
    }
}

/// Information about configuration degradation events.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDegradation {
    /// The reason the configuration could not be refreshed.
    pub reason: ConfigUpdateError,
    /// The last known valid configuration, still in effect.
    pub last_valid: Box<Config>,
}

/// Errors produced by [`ConfigManager`].
#[derive(Debug)]
pub enum ConfigManagerError {
    /// The internal configuration state lock was poisoned.
    Poisoned,
}

impl std::fmt::Display for ConfigManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poisoned => write!(f, "config state lock poisoned"),
        }
    }
}

impl std::error::Error for ConfigManagerError {}

/// Tracks the last known valid configuration.
#[derive(Debug)]
pub struct ConfigManager {
    state: RwLock<Config>,
}

impl ConfigManager {
    pub fn new(initial: Config) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    fn with_state<F, T>(&self, f: F) -> Result<T, ConfigManagerError>
    where
        F: FnOnce(&Config) -> T,
    {
        self.state
            .read()
            .map_err(|_| ConfigManagerError::Poisoned)
            .map(|guard| f(&guard))
    }

    /// Returns the last successfully applied configuration.
    pub fn last_valid(&self) -> Result<Config, ConfigManagerError> {
        self.with_state(Clone::clone)
    }

    /// Pairs a refresh failure with the configuration that stays in effect.
    pub fn degraded(
        &self,
        reason: ConfigUpdateError,
    ) -> Result<ConfigDegradation, ConfigManagerError> {
        self.with_state(|config| ConfigDegradation {
            reason,
            last_valid: Box::new(config.clone()),
        })
    }

    /// Applies a freshly loaded configuration, computing the impact relative to
    /// the previous state.
    pub fn apply(&self, updated: Config) -> Result<ConfigApplied, ConfigManagerError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| ConfigManagerError::Poisoned)?;

        let impact = compute_impact(&guard, &updated);
        *guard = updated.clone();

        Ok(ConfigApplied {
            config: Arc::new(updated),
            impact,
        })
    }
}

fn compute_impact(previous: &Config, next: &Config) -> ConfigImpact {
    ConfigImpact {
        elements_changed: previous.elements != next.elements,
        page_changed: previous.page != next.page,
        appearance_changed: previous.appearance != next.appearance,
        typeset_changed: previous.typeset != next.typeset,
        log_level_changed: previous.log_level != next.log_level,
    }
}
