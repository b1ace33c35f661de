//! Subcommand implementations.

pub mod lock;
pub mod mixed;
pub mod pressure;
pub mod read;
pub mod write;

use memlat_core::RunOutcome;

/// How a run ended; decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Natural completion, exit 0.
    Full,
    /// Cancelled mid-run; a partial report may exist, exit 1.
    Interrupted,
}

/// Map a driver outcome onto the exit-code decision.
pub fn completion(outcome: &RunOutcome) -> Completion {
    if outcome.interrupted {
        Completion::Interrupted
    } else {
        Completion::Full
    }
}
