//! Verify command implementation.

use crate::commands::read_entries;
use crate::output;
use synapse_governance::verify_entries;
use tracing::warn;

pub fn run(
    journal: String,
    strict: bool,
    json_output: bool,
    max_size: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, entries) = read_entries(&journal, max_size)?;
    let verification = verify_entries(&entries);

    if json_output {
        println!("{}", output::format_json(&verification));
    } else if verification.is_valid {
        println!("Chain valid: {} entries", verification.total_entries);
    } else {
        let last_valid = verification
            .last_valid_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "none".to_string());
        let broken = verification
            .broken_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "Chain BROKEN at index {} (last valid: {}, total entries: {})",
            broken, last_valid, verification.total_entries
        );
    }

    if !verification.is_valid {
        warn!(broken_index = ?verification.broken_index, "ledger chain failed verification");
        if strict {
            std::process::exit(1);
        }
    }

    Ok(())
}
