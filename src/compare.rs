use crate::credential::Credential;
use crate::directory::DirectoryRecord;
use crate::host_query::{HostDescription, HostDescriptionQuery, lookup};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Match,
    Mismatch,
    /// The directory has no description; the local side may or may not.
    NoDirectoryDescription,
    NoLocalDescription,
}

/// One computer that answered the host query, with both descriptions
/// normalized. `None` means absent or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub name: String,
    pub directory_description: Option<String>,
    pub local_description: Option<String>,
    pub class: RowClass,
}

/// A computer that never made it into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachableHost {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    /// In directory search order, unreachable hosts removed.
    pub rows: Vec<ComparisonRow>,
    pub unreachable: Vec<UnreachableHost>,
}

/// Trim surrounding whitespace; blank becomes absent. Internal whitespace
/// is left alone.
pub fn normalize(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Query each computer's local description and pair it with the directory
/// value.
///
/// Hosts are queried one at a time in the order given. A host that cannot
/// be contacted is logged and left out of `rows`; every other condition
/// (missing description on either side, differing values) is logged but the
/// row is kept.
pub fn compare(
    records: &[DirectoryRecord],
    hosts: &dyn HostDescriptionQuery,
    credential: Option<&Credential>,
) -> Comparison {
    let mut comparison = Comparison::default();

    for (index, record) in records.iter().enumerate() {
        debug!("[{}/{}] Querying {}", index + 1, records.len(), record.name);

        let local = match lookup(hosts, &record.name, credential) {
            HostDescription::Reported(description) => description,
            HostDescription::Unreachable { reason } => {
                warn!("{}: unable to contact host ({})", record.name, reason);
                comparison.unreachable.push(UnreachableHost {
                    name: record.name.clone(),
                    reason,
                });
                continue;
            }
        };

        let directory_description = normalize(record.description.as_deref());
        if directory_description.is_none() {
            warn!("{}: no directory description", record.name);
        }

        let local_description = normalize(Some(&local));
        if local_description.is_none() {
            warn!("{}: no local description", record.name);
        }

        if directory_description != local_description {
            warn!("{}: needs update", record.name);
        }

        let class = classify(&directory_description, &local_description);

        comparison.rows.push(ComparisonRow {
            name: record.name.clone(),
            directory_description,
            local_description,
            class,
        });
    }

    comparison
}

fn classify(directory: &Option<String>, local: &Option<String>) -> RowClass {
    match (directory, local) {
        (None, _) => RowClass::NoDirectoryDescription,
        (Some(_), None) => RowClass::NoLocalDescription,
        (Some(d), Some(l)) if d == l => RowClass::Match,
        (Some(_), Some(_)) => RowClass::Mismatch,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host_query::HostQueryError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Host test double: hosts missing from the map fail, and every lookup
    /// is recorded.
    #[derive(Default)]
    pub(crate) struct StubHosts {
        pub answers: HashMap<String, String>,
        pub queried: RefCell<Vec<String>>,
    }

    impl StubHosts {
        pub(crate) fn with(answers: &[(&str, &str)]) -> Self {
            StubHosts {
                answers: answers
                    .iter()
                    .map(|(h, d)| (h.to_string(), d.to_string()))
                    .collect(),
                queried: RefCell::new(Vec::new()),
            }
        }
    }

    impl HostDescriptionQuery for StubHosts {
        fn get_local_description(
            &self,
            host: &str,
            _credential: Option<&Credential>,
        ) -> Result<Option<String>, HostQueryError> {
            self.queried.borrow_mut().push(host.to_string());
            match self.answers.get(host) {
                Some(d) => Ok(Some(d.clone())),
                None => Err(HostQueryError::Timeout {
                    host: host.to_string(),
                    timeout: std::time::Duration::from_secs(30),
                }),
            }
        }
    }

    pub(crate) fn record(name: &str, description: Option<&str>) -> DirectoryRecord {
        DirectoryRecord {
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_trims_outer_whitespace_only() {
        assert_eq!(
            normalize(Some("  Lab  PC01 \t")),
            Some("Lab  PC01".to_string())
        );
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn test_unreachable_hosts_dropped_order_kept() {
        let records = vec![
            record("PC03", Some("three")),
            record("PC01", Some("one")),
            record("PC02", Some("two")),
        ];
        let hosts = StubHosts::with(&[("PC03", "three"), ("PC02", "2")]);

        let comparison = compare(&records, &hosts, None);

        let names: Vec<&str> = comparison.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["PC03", "PC02"]);
        assert_eq!(comparison.unreachable.len(), 1);
        assert_eq!(comparison.unreachable[0].name, "PC01");
        assert_eq!(*hosts.queried.borrow(), vec!["PC03", "PC01", "PC02"]);
    }

    #[test]
    fn test_classification() {
        let records = vec![
            record("MATCH", Some(" Same ")),
            record("DIFF", Some("Old")),
            record("NO-AD", None),
            record("NO-LOCAL", Some("Kept")),
            record("BLANK-AD", Some("   ")),
        ];
        let hosts = StubHosts::with(&[
            ("MATCH", "Same\n"),
            ("DIFF", "New"),
            ("NO-AD", "Finance-WKS7"),
            ("NO-LOCAL", ""),
            ("BLANK-AD", "x"),
        ]);

        let comparison = compare(&records, &hosts, None);
        let classes: Vec<RowClass> = comparison.rows.iter().map(|r| r.class).collect();

        assert_eq!(
            classes,
            vec![
                RowClass::Match,
                RowClass::Mismatch,
                RowClass::NoDirectoryDescription,
                RowClass::NoLocalDescription,
                RowClass::NoDirectoryDescription,
            ]
        );
        assert_eq!(comparison.rows[0].directory_description.as_deref(), Some("Same"));
        assert_eq!(comparison.rows[0].local_description.as_deref(), Some("Same"));
        assert_eq!(comparison.rows[3].local_description, None);
        assert!(comparison.unreachable.is_empty());
    }

    #[test]
    fn test_compare_is_idempotent() {
        let records = vec![record("A", Some("x")), record("B", None), record("C", Some("y"))];
        let hosts = StubHosts::with(&[("A", "x "), ("B", "b")]);

        let first = compare(&records, &hosts, None);
        let second = compare(&records, &hosts, None);

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let hosts = StubHosts::default();
        let comparison = compare(&[], &hosts, None);
        assert!(comparison.rows.is_empty());
        assert!(comparison.unreachable.is_empty());
    }
}
