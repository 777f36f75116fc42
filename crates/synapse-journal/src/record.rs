use serde_json::Value;

/// Raw JSON payload of a journal record.
pub type RecordJson = Value;

/// Fields every persisted ledger entry carries.
const ENTRY_FIELDS: [&str; 6] = ["index", "timestamp", "event", "data", "hash", "previousHash"];

/// Cheap structural check that a record looks like a ledger entry.
///
/// This does not recompute hashes; use the ledger's chain verification for
/// integrity.
pub fn has_entry_shape(value: &RecordJson) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    ENTRY_FIELDS.iter().all(|field| obj.contains_key(*field))
}
