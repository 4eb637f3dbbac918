use crate::compare::ComparisonRow;

/// A directory update to make: set `name`'s description to
/// `local_description`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlanEntry {
    pub name: String,
    pub directory_description: Option<String>,
    /// Never empty.
    pub local_description: String,
}

/// Whether the directory value already counts as carrying the local value.
///
/// This is a case-insensitive containment test, not equality: a directory
/// description of "Lab PC01-extra" is considered in sync with a local
/// description of "Lab PC01".
// TODO: confirm with the directory owners whether containment should be
// tightened to exact equality.
pub fn already_synchronized(directory: Option<&str>, local: &str) -> bool {
    match directory {
        Some(directory) => directory.to_lowercase().contains(&local.to_lowercase()),
        None => false,
    }
}

/// Select rows whose local description should be pushed to the directory.
/// Order follows `rows`.
pub fn plan(rows: &[ComparisonRow]) -> Vec<UpdatePlanEntry> {
    rows.iter()
        .filter_map(|row| {
            let local = row.local_description.as_deref()?;
            if local.is_empty()
                || already_synchronized(row.directory_description.as_deref(), local)
            {
                return None;
            }
            Some(UpdatePlanEntry {
                name: row.name.clone(),
                directory_description: row.directory_description.clone(),
                local_description: local.to_string(),
            })
        })
        .collect()
}
