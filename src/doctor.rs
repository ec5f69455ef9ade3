use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::store::{ServerRecord, Store, SINCE_FORMAT};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
    pub overall_health: CheckStatus,
}

/// Read-only health checks over a store file.
pub struct LedgerDoctor;

impl LedgerDoctor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, store: &Store) -> DoctorReport {
        let mut checks = Vec::new();

        checks.push(self.check_presence(store));

        match store.load_strict() {
            Ok(records) => {
                checks.push(DoctorCheck {
                    name: "Store Format".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("{} server(s) parsed", records.len()),
                });
                checks.push(self.check_unique_names(&records));
                checks.push(self.check_state_invariant(&records));
                checks.push(self.check_since_format(&records));
            }
            Err(e) => checks.push(DoctorCheck {
                name: "Store Format".to_string(),
                status: CheckStatus::Fail,
                message: format!("{:#} (requests will see an empty list)", e),
            }),
        }

        let overall_health = if checks.iter().any(|c| matches!(c.status, CheckStatus::Fail)) {
            CheckStatus::Fail
        } else if checks
            .iter()
            .any(|c| matches!(c.status, CheckStatus::Warning))
        {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        };

        DoctorReport {
            checks,
            overall_health,
        }
    }

    fn check_presence(&self, store: &Store) -> DoctorCheck {
        if store.path().exists() {
            DoctorCheck {
                name: "Store File".to_string(),
                status: CheckStatus::Pass,
                message: format!("Found {}", store.path().display()),
            }
        } else {
            DoctorCheck {
                name: "Store File".to_string(),
                status: CheckStatus::Warning,
                message: format!(
                    "{} does not exist; no servers to reserve",
                    store.path().display()
                ),
            }
        }
    }

    fn check_unique_names(&self, records: &[ServerRecord]) -> DoctorCheck {
        let mut seen = HashSet::new();
        let mut dupes: Vec<&str> = Vec::new();
        for r in records {
            if !seen.insert(r.name.as_str()) && !dupes.contains(&r.name.as_str()) {
                dupes.push(&r.name);
            }
        }

        if dupes.is_empty() {
            DoctorCheck {
                name: "Unique Names".to_string(),
                status: CheckStatus::Pass,
                message: "All server names are unique".to_string(),
            }
        } else {
            DoctorCheck {
                name: "Unique Names".to_string(),
                status: CheckStatus::Fail,
                message: format!(
                    "Duplicate names (only the first is ever used): {}",
                    dupes.join(", ")
                ),
            }
        }
    }

    fn check_state_invariant(&self, records: &[ServerRecord]) -> DoctorCheck {
        let broken: Vec<&str> = records
            .iter()
            .filter(|r| !r.is_consistent())
            .map(|r| r.name.as_str())
            .collect();

        if broken.is_empty() {
            DoctorCheck {
                name: "Reservation State".to_string(),
                status: CheckStatus::Pass,
                message: "Every record matches its state".to_string(),
            }
        } else {
            DoctorCheck {
                name: "Reservation State".to_string(),
                status: CheckStatus::Fail,
                message: format!(
                    "Holder/timestamp disagree with state on: {}",
                    broken.join(", ")
                ),
            }
        }
    }

    fn check_since_format(&self, records: &[ServerRecord]) -> DoctorCheck {
        let odd: Vec<&str> = records
            .iter()
            .filter(|r| !r.is_free() && !r.since.is_empty())
            .filter(|r| chrono::NaiveDateTime::parse_from_str(&r.since, SINCE_FORMAT).is_err())
            .map(|r| r.name.as_str())
            .collect();

        if odd.is_empty() {
            DoctorCheck {
                name: "Timestamps".to_string(),
                status: CheckStatus::Pass,
                message: "Reservation timestamps are well-formed".to_string(),
            }
        } else {
            DoctorCheck {
                name: "Timestamps".to_string(),
                status: CheckStatus::Warning,
                message: format!("Unexpected timestamp format on: {}", odd.join(", ")),
            }
        }
    }
}
