use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to create transcript {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-run record of everything shown to the operator.
///
/// Cloning shares the underlying file, so console output and log events
/// land interleaved in one transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
    file: Arc<File>,
}

impl Transcript {
    pub fn file_name(started: &DateTime<Local>) -> String {
        started.format("descsync-%Y%m%d-%H%M%S.log").to_string()
    }

    /// Create a new transcript in `dir`, named after `started`.
    pub fn create(dir: &Path, started: DateTime<Local>) -> Result<Self, TranscriptError> {
        let path = dir.join(Self::file_name(&started));

        let create_error = |source| TranscriptError::Create {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(create_error)?;

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(create_error)?;

        let transcript = Transcript {
            path: path.clone(),
            file: Arc::new(file),
        };
        transcript.line(&format!("Transcript started {}", started.to_rfc3339()));

        Ok(transcript)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line. Transcript write failures never interrupt a run.
    pub fn line(&self, text: &str) {
        let _ = writeln!(&*self.file, "{text}");
    }

    /// A handle usable as a `tracing_subscriber` writer.
    pub fn writer(&self) -> Arc<File> {
        Arc::clone(&self.file)
    }
}
