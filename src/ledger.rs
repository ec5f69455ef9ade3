use anyhow::Result;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::log_event;
use crate::store::{ServerRecord, ServerState, Store};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyUser,
}

/// What a reserve or release call did. None of these are faults.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum Outcome {
    Reserved,
    Released,
    AlreadyOccupied,
    Denied,
    NotFound,
    Rejected(RejectReason),
}

impl Outcome {
    /// True when the call changed the holder of a server.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Reserved | Outcome::Released)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Reserved => write!(f, "reserved"),
            Outcome::Released => write!(f, "released"),
            Outcome::AlreadyOccupied => write!(f, "already occupied"),
            Outcome::Denied => write!(f, "denied"),
            Outcome::NotFound => write!(f, "not found"),
            Outcome::Rejected(RejectReason::EmptyUser) => write!(f, "rejected: empty user"),
        }
    }
}

/// Reservation ledger over a single [`Store`].
///
/// Every operation runs its whole load-mutate-persist cycle while holding
/// `gate`. Share one instance per backing file (`Arc<Ledger>`).
pub struct Ledger {
    store: Store,
    gate: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn list(&self) -> Vec<ServerRecord> {
        let _guard = self.lock();
        self.store.load()
    }

    pub fn reserve(&self, name: &str, user: &str) -> Result<Outcome> {
        let user = user.trim();
        if user.is_empty() {
            return Ok(Outcome::Rejected(RejectReason::EmptyUser));
        }

        let _guard = self.lock();
        let mut records = self.store.load();
        let Some(record) = records.iter_mut().find(|r| r.name == name) else {
            log_event(&format!("❓ Reserve {} by {}: no such server", name, user));
            return Ok(Outcome::NotFound);
        };

        let outcome = match record.state {
            ServerState::Free => {
                record.occupy(user);
                Outcome::Reserved
            }
            ServerState::Occupied => Outcome::AlreadyOccupied,
        };
        self.store.save(&records)?;

        log_event(&format!("🔒 Reserve {} by {}: {}", name, user, outcome));
        Ok(outcome)
    }

    pub fn release(&self, name: &str, user: &str) -> Result<Outcome> {
        let user = user.trim();
        if user.is_empty() {
            return Ok(Outcome::Rejected(RejectReason::EmptyUser));
        }

        let _guard = self.lock();
        let mut records = self.store.load();
        let Some(record) = records.iter_mut().find(|r| r.name == name) else {
            log_event(&format!("❓ Release {} by {}: no such server", name, user));
            return Ok(Outcome::NotFound);
        };

        if record.state != ServerState::Occupied || record.user != user {
            log_event(&format!(
                "🚫 Release {} by {}: denied (holder: {:?})",
                name, user, record.user
            ));
            return Ok(Outcome::Denied);
        }

        record.vacate();
        self.store.save(&records)?;

        log_event(&format!("🔓 Release {} by {}: released", name, user));
        Ok(Outcome::Released)
    }

    // Poison is ignored: saves are atomic renames, so a panic mid-cycle
    // never leaves a torn file.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
