//! Directory service access.
//!
//! The reconciliation pipeline only needs three logical operations against
//! the directory: search computers by name pattern, set a computer's
//! description, and read it back for verification. `DirectoryClient`
//! captures those; `FileDirectory` implements them over a description file.

use crate::credential::Credential;
use crate::description_file::{ComputerEntry, DescriptionFile, DescriptionFileError};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory store error: {0}")]
    Store(#[from] DescriptionFileError),
    #[error("Computer not found in directory: {0}")]
    UnknownComputer(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Search term must not be empty")]
    Empty,
    #[error("Invalid search term {term:?}: {source}")]
    Invalid {
        term: String,
        source: globset::Error,
    },
}

/// A computer object as returned by a directory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub name: String,
    pub description: Option<String>,
}

pub trait DirectoryClient {
    /// Return matching computers in the order the directory yields them.
    fn search(
        &self,
        pattern: &NamePattern,
        credential: Option<&Credential>,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError>;

    /// Set the description attribute. With `dry_run` nothing is mutated.
    fn set_description(
        &mut self,
        name: &str,
        description: &str,
        credential: Option<&Credential>,
        dry_run: bool,
    ) -> Result<(), DirectoryError>;

    /// Re-read the description attribute of a single computer.
    fn get_description(
        &self,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<String>, DirectoryError>;
}

/// Directory-style "-like" name pattern.
///
/// `*` matches any run of characters and `?` exactly one; every other
/// character is literal. Matching ignores case. A term without wildcards
/// matches any name containing it.
#[derive(Debug, Clone)]
pub struct NamePattern {
    term: String,
    matcher: GlobMatcher,
}

impl NamePattern {
    pub fn parse(term: &str) -> Result<Self, PatternError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut glob: String = term
            .chars()
            .map(|c| match c {
                '*' | '?' => c.to_string(),
                _ => globset::escape(c.encode_utf8(&mut [0; 4])),
            })
            .collect();
        if !term.contains(['*', '?']) {
            glob = format!("*{glob}*");
        }

        let matcher = GlobBuilder::new(&glob)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError::Invalid {
                term: term.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(NamePattern {
            term: term.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }
}

/// Shows the term as the operator typed it.
impl std::fmt::Display for NamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.term)
    }
}

/// A directory kept in a description file on disk.
///
/// Every operation re-reads the file so that verification observes what
/// was actually persisted.
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    /// Open an existing directory file, failing early if it is unreadable.
    pub fn open(path: &Path) -> Result<Self, DirectoryError> {
        DescriptionFile::load(path)?;
        Ok(FileDirectory {
            path: path.to_path_buf(),
        })
    }
}

impl DirectoryClient for FileDirectory {
    fn search(
        &self,
        pattern: &NamePattern,
        credential: Option<&Credential>,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        debug!(
            "Searching {} for '{}' as {}",
            self.path.display(),
            pattern,
            credential.map_or("ambient identity".to_string(), |c| c.to_string())
        );

        let file = DescriptionFile::load(&self.path)?;

        Ok(file
            .computers
            .into_iter()
            .filter(|(name, _)| pattern.matches(name))
            .map(|(name, entry)| DirectoryRecord {
                name,
                description: entry.description,
            })
            .collect())
    }

    fn set_description(
        &mut self,
        name: &str,
        description: &str,
        _credential: Option<&Credential>,
        dry_run: bool,
    ) -> Result<(), DirectoryError> {
        let mut file = DescriptionFile::load(&self.path)?;

        let Some(entry) = file.computers.get_mut(name) else {
            return Err(DirectoryError::UnknownComputer(name.to_string()));
        };

        if dry_run {
            info!("What if: set description of {name} to '{description}'");
            return Ok(());
        }

        *entry = ComputerEntry {
            description: Some(description.to_string()),
        };
        file.save(&self.path)?;
        debug!("Wrote description of {} to {}", name, self.path.display());

        Ok(())
    }

    fn get_description(
        &self,
        name: &str,
        _credential: Option<&Credential>,
    ) -> Result<Option<String>, DirectoryError> {
        let file = DescriptionFile::load(&self.path)?;

        match file.computers.get(name) {
            Some(entry) => Ok(entry.description.clone()),
            None => Err(DirectoryError::UnknownComputer(name.to_string())),
        }
    }
}
