use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DescriptionFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Description file not found: {0}")]
    NotFound(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unsupported description file version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputerEntry {
    /// Absent when the attribute has never been set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Metadata {
    version: u32,
}

/// Only the metadata section, used to check the version before parsing
/// the rest of the file. Deliberately tolerates unknown content.
#[derive(Debug, Deserialize)]
struct MetadataOnly {
    metadata: Metadata,
}

/// A store of computer names and their description attribute.
///
/// The same format serves as the directory store and as a snapshot of
/// descriptions held on the hosts themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptionFile {
    metadata: Metadata,
    #[serde(default)]
    pub computers: BTreeMap<String, ComputerEntry>,
}

impl DescriptionFile {
    const SUPPORTED_VERSION: u32 = 1;

    #[cfg(test)]
    pub fn new(computers: BTreeMap<String, ComputerEntry>) -> Self {
        DescriptionFile {
            metadata: Metadata {
                version: Self::SUPPORTED_VERSION,
            },
            computers,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, DescriptionFileError> {
        // Check the version first so a file written by a newer release is
        // reported as such rather than as an unknown field.
        let metadata_only: MetadataOnly = toml::from_str(content)?;

        if metadata_only.metadata.version != Self::SUPPORTED_VERSION {
            return Err(DescriptionFileError::UnsupportedVersion(
                metadata_only.metadata.version,
            ));
        }

        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, DescriptionFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, DescriptionFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Self::from_toml(&content)
    }

    /// Replace the file at `path` atomically via a synced temporary file in
    /// the same directory.
    pub fn save(&self, path: &Path) -> Result<(), DescriptionFileError> {
        use std::io::Write;

        let content = self.to_toml()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| io_error(parent, e))?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(path)
            .map_err(|e| io_error(path, e.error))?;
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> DescriptionFileError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            DescriptionFileError::PermissionDenied(path.to_path_buf())
        }
        std::io::ErrorKind::NotFound => DescriptionFileError::NotFound(path.to_path_buf()),
        _ => DescriptionFileError::Io(e),
    }
}
