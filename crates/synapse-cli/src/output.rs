//! Output formatting utilities.

use serde::Serialize;
use synapse_governance::LedgerEntry;

/// Pretty JSON, or `{}` if the value cannot be serialized.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an entry as a table row.
pub fn format_table_row(entry: &LedgerEntry) -> String {
    format!(
        "{:<8} {:<18} {:<25} {}",
        entry.index,
        entry.event.as_str(),
        truncate(entry.timestamp.as_str(), 25),
        truncate(&entry.hash, 20)
    )
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!("{:<8} {:<18} {:<25} {}", "INDEX", "EVENT", "TIMESTAMP", "HASH");
    println!("{}", "-".repeat(80));
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .nth(max_len.saturating_sub(3))
        .map_or(s.len(), |(i, _)| i);
    format!("{}...", &s[..cut])
}
