//! Health command implementation.

use crate::commands::read_entries;
use crate::output;
use synapse_governance::{check_governance, HealthStatus, KernelFreeze};

pub fn run(
    journal: String,
    freeze: Option<String>,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, entries) = read_entries(&journal, None)?;
    let declaration = freeze.map(KernelFreeze::load).transpose()?;

    let health = check_governance(entries.as_slice(), declaration.as_ref());
    println!("{}", output::format_json(&health));

    if strict && health.status == HealthStatus::Degraded {
        std::process::exit(1);
    }
    Ok(())
}
