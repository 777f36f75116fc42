//! List command implementation.

use crate::commands::check_size;
use crate::output;
use crate::path;
use synapse_governance::LedgerEntry;
use synapse_journal::{JournalReader, ReadMode};

pub fn run(
    journal: String,
    json: bool,
    max_entries: Option<u64>,
    max_size: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let journal_path = path::validate_journal_path(&journal, false)
        .map_err(|e| format!("Invalid journal path: {}", e))?;
    check_size(&journal_path, max_size)?;

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).map_err(|e| {
        let sanitized = path::sanitize_path_for_error(&journal_path);
        format!("Failed to open journal file: {}: {}", sanitized, e)
    })?;

    if !json {
        output::print_table_header();
    }

    let mut entry_count: u64 = 0;
    while let Some(entry) = reader.read_record::<LedgerEntry>()? {
        if let Some(max) = max_entries {
            if entry_count >= max {
                break;
            }
        }

        if json {
            println!("{}", serde_json::to_string(&entry)?);
        } else {
            println!("{}", output::format_table_row(&entry));
        }
        entry_count += 1;
    }

    Ok(())
}
