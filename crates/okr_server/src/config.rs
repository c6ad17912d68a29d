//! Startup configuration read from `OKR_*` environment variables.
//!
//! Blank values count as unset.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8001";
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;

const ENV_DB_PATH: &str = "OKR_DB_PATH";
const ENV_BIND: &str = "OKR_SERVER_BIND";
const ENV_LOG_LEVEL: &str = "OKR_LOG_LEVEL";
const ENV_LOG_DIR: &str = "OKR_LOG_DIR";
const ENV_GENERATOR_URL: &str = "OKR_GENERATOR_URL";
const ENV_GENERATOR_TIMEOUT: &str = "OKR_GENERATOR_TIMEOUT_SECS";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
            Self::CurrentDir(err) => write!(f, "cannot resolve working directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// SQLite file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Always absolute.
    pub log_dir: PathBuf,
    /// Upstream generator endpoint; `None` disables generation.
    pub generator_url: Option<String>,
    pub generator_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;

        let bind_text = read(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_text
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidValue {
                key: ENV_BIND,
                value: bind_text.clone(),
                reason: err.to_string(),
            })?;

        let generator_timeout = match read(ENV_GENERATOR_TIMEOUT) {
            None => Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
            Some(text) => match text.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_GENERATOR_TIMEOUT,
                        value: text,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
        };

        let log_dir = read(ENV_LOG_DIR)
            .map(|dir| absolutize(&cwd, Path::new(&dir)))
            .unwrap_or_else(|| cwd.join("data").join("logs"));

        Ok(Self {
            bind_addr,
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level: read(ENV_LOG_LEVEL)
                .unwrap_or_else(|| okr_core::default_log_level().to_string()),
            log_dir,
            generator_url: read(ENV_GENERATOR_URL),
            generator_timeout,
        })
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
