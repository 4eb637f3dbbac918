use crate::console::Operator;
use crate::credential::Credential;
use crate::directory::DirectoryClient;
use crate::plan::UpdatePlanEntry;
use crate::report::entry_view;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Apply every planned update without asking.
    BatchAll,
    /// Ask before each update.
    Interactive,
}

impl UpdateMode {
    /// `1` is batch, `2` is interactive, anything else means quit.
    pub fn from_selection(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(UpdateMode::BatchAll),
            "2" => Some(UpdateMode::Interactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Written and read back with the intended value.
    Applied,
    /// Dry run; nothing was written.
    Simulated,
    Failed,
    Skipped,
    Cancelled,
}

/// Operator answer to a per-entry confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Yes,
    No,
    Quit,
}

impl Response {
    pub fn parse(input: &str) -> Self {
        let input = input.trim().to_lowercase();
        if input == "y" || input == "yes" {
            Response::Yes
        } else if input.starts_with('q') {
            Response::Quit
        } else {
            Response::No
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub applied: usize,
    pub simulated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Applied => &mut self.applied,
            Outcome::Simulated => &mut self.simulated,
            Outcome::Failed => &mut self.failed,
            Outcome::Skipped => &mut self.skipped,
            Outcome::Cancelled => &mut self.cancelled,
        };
        *counter += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// One per plan entry, in plan order.
    pub outcomes: Vec<EntryOutcome>,
    pub counts: OutcomeCounts,
}

impl ExecutionReport {
    fn push(&mut self, name: &str, outcome: Outcome) {
        self.counts.record(outcome);
        self.outcomes.push(EntryOutcome {
            name: name.to_string(),
            outcome,
        });
    }
}

pub struct ExecuteOptions<'a> {
    pub mode: UpdateMode,
    pub dry_run: bool,
    pub credential: Option<&'a Credential>,
}

/// Apply `plan` to the directory.
///
/// Entries are processed strictly in order and a failed entry never stops
/// the run. In interactive mode a quit answer marks the current entry and
/// everything after it as cancelled without further prompts. Every entry
/// of `plan` gets exactly one outcome in the returned report.
pub fn execute(
    plan: &[UpdatePlanEntry],
    options: &ExecuteOptions<'_>,
    directory: &mut dyn DirectoryClient,
    operator: &mut dyn Operator,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    let total = plan.len();

    for (index, entry) in plan.iter().enumerate() {
        if options.mode == UpdateMode::Interactive {
            for line in entry_view(entry) {
                operator.say(&line);
            }

            let prompt = format!("Update description of {}? [y/N/q] ", entry.name);
            let response = match operator.ask(&prompt) {
                Ok(answer) => Response::parse(&answer),
                Err(e) => {
                    error!("{e}");
                    Response::Quit
                }
            };

            match response {
                Response::Yes => {}
                Response::No => {
                    operator.say(&outcome_line(entry, Outcome::Skipped));
                    report.push(&entry.name, Outcome::Skipped);
                    continue;
                }
                Response::Quit => {
                    info!("Cancelled by operator; {} update(s) not processed", total - index);
                    for remaining in &plan[index..] {
                        report.push(&remaining.name, Outcome::Cancelled);
                    }
                    break;
                }
            }
        }

        info!("[{}/{}] Updating {}", index + 1, total, entry.name);
        let outcome = apply_entry(entry, options, directory);
        operator.say(&outcome_line(entry, outcome));
        report.push(&entry.name, outcome);
    }

    report
}

/// Write one entry and, unless simulating, read it back to confirm.
fn apply_entry(
    entry: &UpdatePlanEntry,
    options: &ExecuteOptions<'_>,
    directory: &mut dyn DirectoryClient,
) -> Outcome {
    let written = directory.set_description(
        &entry.name,
        &entry.local_description,
        options.credential,
        options.dry_run,
    );

    // Dry-run entries are always Simulated, whatever the call reported.
    if options.dry_run {
        if let Err(e) = written {
            warn!("Dry run: directory rejected {}: {}", entry.name, e);
        }
        return Outcome::Simulated;
    }

    if let Err(e) = written {
        error!("Failed to update {}: {}", entry.name, e);
        return Outcome::Failed;
    }

    match directory.get_description(&entry.name, options.credential) {
        Ok(Some(current)) if current == entry.local_description => Outcome::Applied,
        Ok(current) => {
            warn!(
                "{}: directory reads back '{}' after update, expected '{}'",
                entry.name,
                current.as_deref().unwrap_or(""),
                entry.local_description
            );
            Outcome::Failed
        }
        Err(e) => {
            error!("Failed to verify {}: {}", entry.name, e);
            Outcome::Failed
        }
    }
}

fn outcome_line(entry: &UpdatePlanEntry, outcome: Outcome) -> String {
    match outcome {
        Outcome::Applied => format!(
            "Updated {}: description is now '{}'",
            entry.name, entry.local_description
        ),
        Outcome::Simulated => format!(
            "Dry run: would set description of {} to '{}'",
            entry.name, entry.local_description
        ),
        Outcome::Failed => format!("Failed to update {}", entry.name),
        Outcome::Skipped => format!("Skipped {}", entry.name),
        Outcome::Cancelled => format!("Cancelled {}", entry.name),
    }
}
