//! Result document emission.

use anyhow::Result;
use memlat_core::RunOutcome;

/// Print the result document to stdout, exactly once, if the run produced
/// one. Diagnostics never go here; stdout stays machine-readable.
pub fn emit(outcome: &RunOutcome) -> Result<()> {
    if let Some(report) = &outcome.report {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}
