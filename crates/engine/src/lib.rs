//! Engine crate – shared backend logic for the Election Tracker tooling.
//!
//! Holds the startup doctor (every probe step plus the diagnosis table) and
//! the candidate seeder. OS and network access sits behind the traits in
//! [`traits`], so the CLI wires in real implementations and the tests wire
//! in fakes.

pub mod config;
pub mod context;
pub mod diagnosis;
pub mod doctor;
pub mod platform;
pub mod probes;
pub mod seed;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::DiagnosticConfig;
pub use context::{EnvSnapshot, ProbeContext};
pub use types::{Diagnosis, DoctorReport, ErrorCode, RunResult, Status, Step};
