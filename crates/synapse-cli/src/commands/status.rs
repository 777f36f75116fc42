//! Status command implementation.

use crate::commands::read_entries;
use crate::output;
use chrono::Utc;
use synapse_governance::{LedgerEntry, LedgerStatus};

pub fn run(journal: String, snapshot: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, entries) = read_entries(&journal, None)?;

    if snapshot {
        let redacted: Vec<_> = entries.iter().map(LedgerEntry::redacted).collect();
        println!("{}", output::format_json(&redacted));
    } else {
        let status = LedgerStatus::from_entries(&entries, Utc::now());
        println!("{}", output::format_json(&status));
    }
    Ok(())
}
