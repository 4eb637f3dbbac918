use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "descsync.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("No host source configured (set [hosts] file or [hosts] command)")]
    NoHostSource,
    #[error("Both [hosts] file and [hosts] command are set; choose one")]
    ConflictingHostSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Simulate every directory write.
    pub dry_run: bool,
    /// Write a transcript of the run.
    pub transcript: bool,
    pub transcript_dir: PathBuf,
    pub directory: DirectoryConfig,
    pub hosts: HostsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dry_run: false,
            transcript: true,
            transcript_dir: PathBuf::from("."),
            directory: DirectoryConfig::default(),
            hosts: HostsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    pub file: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            file: PathBuf::from("directory.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostsConfig {
    pub file: Option<PathBuf>,
    /// Program and arguments; `{host}` and `{user}` are substituted.
    pub command: Option<Vec<String>>,
    pub timeout_secs: u64,
}

impl Default for HostsConfig {
    fn default() -> Self {
        HostsConfig {
            file: None,
            command: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSource {
    File(PathBuf),
    Command {
        command: Vec<String>,
        timeout: Duration,
    },
}

impl HostsConfig {
    pub fn source(&self) -> Result<HostSource, ConfigError> {
        match (&self.file, &self.command) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingHostSources),
            (Some(file), None) => Ok(HostSource::File(file.clone())),
            (None, Some(command)) => Ok(HostSource::Command {
                command: command.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            }),
            (None, None) => Err(ConfigError::NoHostSource),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `descsync.toml` in the
    /// working directory is used when present, otherwise defaults apply.
    /// Relative paths inside a config file are resolved against the
    /// directory containing it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config = Self::from_toml(&content, &path)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.transcript_dir);
        resolve(&mut self.directory.file);
        if let Some(file) = self.hosts.file.as_mut() {
            resolve(file);
        }
    }
}
