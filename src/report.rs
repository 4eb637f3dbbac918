use crate::compare::{ComparisonRow, RowClass, UnreachableHost};
use crate::execute::OutcomeCounts;
use crate::plan::UpdatePlanEntry;
use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};

const NONE_MARKER: &str = "<none>";

fn class_label(class: RowClass) -> &'static str {
    match class {
        RowClass::Match => "match",
        RowClass::Mismatch => "mismatch",
        RowClass::NoDirectoryDescription => "no-ad-description",
        RowClass::NoLocalDescription => "no-local-description",
    }
}

fn or_none(description: Option<&str>) -> &str {
    description.unwrap_or(NONE_MARKER)
}

/// Plain ASCII borders so tables read the same on a console and in the
/// transcript.
fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header);
    table
}

fn lines(table: &Table) -> Vec<String> {
    table.lines().collect()
}

pub fn comparison_table(rows: &[ComparisonRow]) -> Vec<String> {
    let mut table = new_table(vec!["Name", "Directory", "Local", "Status"]);
    for row in rows {
        table.add_row(vec![
            row.name.as_str(),
            or_none(row.directory_description.as_deref()),
            or_none(row.local_description.as_deref()),
            class_label(row.class),
        ]);
    }
    lines(&table)
}

pub fn plan_table(plan: &[UpdatePlanEntry]) -> Vec<String> {
    let mut table = new_table(vec!["Name", "Directory (current)", "Local (new)"]);
    for entry in plan {
        table.add_row(vec![
            entry.name.as_str(),
            or_none(entry.directory_description.as_deref()),
            entry.local_description.as_str(),
        ]);
    }
    lines(&table)
}

pub fn unreachable_lines(hosts: &[UnreachableHost]) -> Vec<String> {
    hosts
        .iter()
        .map(|host| format!("Not contacted: {} ({})", host.name, host.reason))
        .collect()
}

/// The single-entry view shown before an interactive confirmation.
pub fn entry_view(entry: &UpdatePlanEntry) -> Vec<String> {
    vec![
        format!("Computer:  {}", entry.name),
        format!(
            "Directory: {}",
            or_none(entry.directory_description.as_deref())
        ),
        format!("Local:     {}", entry.local_description),
    ]
}

pub fn summary(counts: &OutcomeCounts) -> String {
    format!(
        "Summary: {} applied, {} simulated, {} failed, {} skipped, {} cancelled",
        counts.applied, counts.simulated, counts.failed, counts.skipped, counts.cancelled
    )
}
