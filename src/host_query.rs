//! Lookup of the description stored on each host.
//!
//! Backends report raw results through `HostDescriptionQuery`; `lookup`
//! folds every failure mode into `HostDescription::Unreachable` so one bad
//! host can never abort a run.

use crate::credential::Credential;
use crate::description_file::{DescriptionFile, DescriptionFileError};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

pub const HOST_PLACEHOLDER: &str = "{host}";
pub const USER_PLACEHOLDER: &str = "{user}";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum HostQueryError {
    #[error("Host snapshot error: {0}")]
    Store(#[from] DescriptionFileError),
    #[error("Failed to run host query for {host}: {source}")]
    Spawn {
        host: String,
        source: std::io::Error,
    },
    #[error("Host query for {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },
    #[error("Host query for {host} failed ({status}): {stderr}")]
    Failed {
        host: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Host query command is empty")]
    EmptyCommand,
}

pub trait HostDescriptionQuery {
    /// `Ok(None)` means the host answered nothing at all, which is treated
    /// like an unreachable host. An empty string is a real (empty) answer.
    fn get_local_description(
        &self,
        host: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<String>, HostQueryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostDescription {
    Reported(String),
    Unreachable { reason: String },
}

pub fn lookup(
    query: &dyn HostDescriptionQuery,
    host: &str,
    credential: Option<&Credential>,
) -> HostDescription {
    match query.get_local_description(host, credential) {
        Ok(Some(description)) => HostDescription::Reported(description),
        Ok(None) => HostDescription::Unreachable {
            reason: "no response".to_string(),
        },
        Err(e) => HostDescription::Unreachable {
            reason: e.to_string(),
        },
    }
}

/// Host descriptions taken from a snapshot file. Hosts missing from the
/// snapshot do not answer.
pub struct FileHostQuery {
    snapshot: DescriptionFile,
}

impl FileHostQuery {
    pub fn open(path: &Path) -> Result<Self, HostQueryError> {
        Ok(FileHostQuery {
            snapshot: DescriptionFile::load(path)?,
        })
    }
}

impl HostDescriptionQuery for FileHostQuery {
    fn get_local_description(
        &self,
        host: &str,
        _credential: Option<&Credential>,
    ) -> Result<Option<String>, HostQueryError> {
        Ok(self
            .snapshot
            .computers
            .get(host)
            .map(|entry| entry.description.clone().unwrap_or_default()))
    }
}

/// Runs an external program once per host and takes its standard output as
/// the description.
///
/// Arguments may contain `{host}` and `{user}`; `{user}` expands to the empty
/// string when running as the ambient identity.
pub struct CommandHostQuery {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandHostQuery {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self, HostQueryError> {
        let (program, args) = command.split_first().ok_or(HostQueryError::EmptyCommand)?;
        Ok(CommandHostQuery {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn expand(&self, host: &str, credential: Option<&Credential>) -> Vec<String> {
        let user = credential.map(|c| c.account.as_str()).unwrap_or("");
        self.args
            .iter()
            .map(|arg| {
                arg.replace(HOST_PLACEHOLDER, host)
                    .replace(USER_PLACEHOLDER, user)
            })
            .collect()
    }
}

impl HostDescriptionQuery for CommandHostQuery {
    fn get_local_description(
        &self,
        host: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<String>, HostQueryError> {
        let args = self.expand(host, credential);
        debug!("Querying {} with {} {:?}", host, self.program, args);

        let spawn_error = |source| HostQueryError::Spawn {
            host: host.to_string(),
            source,
        };

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(spawn_error)?;

        // Drain both pipes off-thread so a chatty child cannot block on a
        // full pipe while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(spawn_error)? {
                break status;
            }
            if Instant::now() >= deadline {
                terminate(&mut child);
                // The pipes are closed now, so the readers are about to finish.
                for reader in [stdout, stderr].into_iter().flatten() {
                    let _ = reader.join();
                }
                return Err(HostQueryError::Timeout {
                    host: host.to_string(),
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.map(collect).unwrap_or_default();
        let stderr = stderr.map(collect).unwrap_or_default();

        if !status.success() {
            return Err(HostQueryError::Failed {
                host: host.to_string(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        let description = stdout.trim_end_matches(['\r', '\n']);
        Ok(Some(description.to_string()))
    }
}

/// Kill the query and everything it started.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    // The child leads its own process group (see `process_group(0)`).
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill only takes numeric arguments.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: std::thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
