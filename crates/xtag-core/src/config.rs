use std::{
    env::VarError,
    fs, io,
    path::{Path, PathBuf},
};

pub mod manager;
pub mod watch;

pub use xtag_proto::config::*;

use log::{info, warn};
use shellexpand::{LookupError, full};
use thiserror::Error;

/// Failures reading one page file.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures locating the page file at startup.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to expand config path: {0}")]
    Expand(#[from] LookupError<VarError>),
    #[error("config file does not exist: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to create config directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves the page file and loads it.
///
/// An explicit `path` must exist. Without one the default location is used and
/// its directory is created when missing. A file that cannot be read or parsed
/// yields the default page.
pub fn get_config(path: Option<PathBuf>) -> Result<(Config, PathBuf), ConfigLoadError> {
    let expanded = match path {
        Some(path) => {
            info!("Config path provided {path:?}");
            let expanded = expand_path(&path)?;

            if !expanded.exists() {
                return Err(ConfigLoadError::Missing { path: expanded });
            }

            expanded
        }
        None => {
            let expanded = expand_path(Path::new(DEFAULT_CONFIG_FILE_PATH))?;

            if let Some(parent) = expanded.parent().filter(|parent| !parent.exists()) {
                fs::create_dir_all(parent).map_err(|source| ConfigLoadError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            expanded
        }
    };

    let config = read_config(&expanded).unwrap_or_else(|err| {
        warn!("{err}, using the default page");
        Config::default()
    });

    Ok((config, expanded))
}

pub fn expand_path(path: &Path) -> Result<PathBuf, LookupError<VarError>> {
    let expanded = full(&path.to_string_lossy())?;

    Ok(PathBuf::from(expanded.as_ref()))
}

pub fn read_config(path: &Path) -> Result<Config, ConfigReadError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigReadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Decoding config file {path:?}");

    let config = toml::from_str(&content).map_err(|source| ConfigReadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Config file loaded successfully");

    Ok(config)
}
