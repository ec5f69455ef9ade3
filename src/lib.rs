pub mod config;
pub mod doctor;
pub mod ledger;
pub mod server;
pub mod store;


pub use ledger::{Ledger, Outcome, RejectReason};
pub use store::{ServerRecord, ServerState, Store};

/// Timestamped event line on stderr.
pub fn log_event(message: &str) {
    eprintln!(
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    );
}
