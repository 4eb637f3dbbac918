//! One reconciliation run, from the search prompt to the summary.

use crate::compare::compare;
use crate::console::{ConsoleError, Operator};
use crate::credential::Credential;
use crate::directory::{DirectoryClient, DirectoryError, NamePattern, PatternError};
use crate::execute::{ExecuteOptions, ExecutionReport, UpdateMode, execute};
use crate::host_query::HostDescriptionQuery;
use crate::plan::plan;
use crate::report;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid search term: {0}")]
    Input(#[from] PatternError),
    #[error("Directory search failed: {0}")]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    NoMatches,
    /// Nothing left to update after comparison.
    AlreadySynchronized,
    /// The operator chose not to update anything.
    Declined,
    Completed(ExecutionReport),
}

pub struct SessionOptions {
    pub dry_run: bool,
}

pub fn run(
    directory: &mut dyn DirectoryClient,
    hosts: &dyn HostDescriptionQuery,
    operator: &mut dyn Operator,
    options: &SessionOptions,
) -> Result<SessionOutcome, SessionError> {
    let term = operator.ask("Computer name search term: ")?;
    let pattern = NamePattern::parse(&term)?;

    let directory_credential =
        Credential::from_input(&operator.ask("Directory account (blank for current user): ")?);
    let host_credential =
        Credential::from_input(&operator.ask("Host account (blank for current user): ")?);

    let records = directory.search(&pattern, directory_credential.as_ref())?;
    if records.is_empty() {
        info!("No computers matched '{}'", pattern);
        return Ok(SessionOutcome::NoMatches);
    }
    info!("Found {} computer(s) matching '{}'", records.len(), pattern);

    let comparison = compare(&records, hosts, host_credential.as_ref());
    if !comparison.unreachable.is_empty() {
        warn!(
            "{} of {} computer(s) could not be contacted",
            comparison.unreachable.len(),
            records.len()
        );
    }

    operator.say("");
    for line in report::comparison_table(&comparison.rows) {
        operator.say(&line);
    }
    for line in report::unreachable_lines(&comparison.unreachable) {
        operator.say(&line);
    }

    let plan = plan(&comparison.rows);
    if plan.is_empty() {
        info!("All reachable computers are already synchronized");
        return Ok(SessionOutcome::AlreadySynchronized);
    }

    operator.say("");
    operator.say(&format!("{} pending update(s):", plan.len()));
    for line in report::plan_table(&plan) {
        operator.say(&line);
    }
    operator.say("");

    if options.dry_run {
        info!("DRY RUN - directory updates will be simulated");
    }

    let selection = operator.ask("Update mode: 1 = update all, 2 = confirm each, other = quit: ")?;
    let Some(mode) = UpdateMode::from_selection(&selection) else {
        info!("No changes made");
        return Ok(SessionOutcome::Declined);
    };

    let execute_options = ExecuteOptions {
        mode,
        dry_run: options.dry_run,
        credential: directory_credential.as_ref(),
    };
    let execution = execute(&plan, &execute_options, directory, operator);

    operator.say("");
    operator.say(&report::summary(&execution.counts));

    Ok(SessionOutcome::Completed(execution))
}
