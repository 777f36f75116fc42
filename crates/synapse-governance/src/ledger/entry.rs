use serde::{Deserialize, Serialize};
use serde_json::Value;
use synapse_canonical::{sha256_hex, to_canonical_string, CanonicalizationError, Timestamp};

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEvent {
    /// A signed decision record issued by the authority.
    DecisionRecorded,
    /// A gate verdict.
    GateVerification,
    /// Genesis and other housekeeping entries.
    SystemEvent,
}

impl LedgerEvent {
    /// Name as hashed and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerEvent::DecisionRecorded => "DECISION_RECORDED",
            LedgerEvent::GateVerification => "GATE_VERIFICATION",
            LedgerEvent::SystemEvent => "SYSTEM_EVENT",
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link of the audit chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Position in the chain, starting at 0.
    pub index: u64,
    /// Append time.
    pub timestamp: Timestamp,
    /// Entry kind.
    pub event: LedgerEvent,
    /// Event payload.
    pub data: Value,
    /// `SHA-256(index ++ timestamp ++ event ++ canonical(data) ++ previousHash)`, hex.
    pub hash: String,
    /// Hash of the preceding entry.
    pub previous_hash: String,
}

impl LedgerEntry {
    /// Hash over the given fields.
    pub fn compute_hash(
        index: u64,
        timestamp: &Timestamp,
        event: LedgerEvent,
        data: &Value,
        previous_hash: &str,
    ) -> Result<String, CanonicalizationError> {
        let canonical = to_canonical_string(data)?;
        let preimage = format!(
            "{index}{timestamp}{event}{canonical}{previous_hash}",
            event = event.as_str()
        );
        Ok(sha256_hex(preimage.as_bytes()))
    }

    /// Recomputes this entry's hash from its current fields.
    pub fn recompute_hash(&self) -> Result<String, CanonicalizationError> {
        Self::compute_hash(
            self.index,
            &self.timestamp,
            self.event,
            &self.data,
            &self.previous_hash,
        )
    }

    /// Copy without the payload.
    pub fn redacted(&self) -> SnapshotEntry {
        SnapshotEntry {
            index: self.index,
            timestamp: self.timestamp.clone(),
            event: self.event,
            hash: self.hash.clone(),
            previous_hash: self.previous_hash.clone(),
        }
    }
}

/// Entry with its `data` stripped, safe to share with third parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Position in the chain.
    pub index: u64,
    /// Append time.
    pub timestamp: Timestamp,
    /// Entry kind.
    pub event: LedgerEvent,
    /// Entry hash.
    pub hash: String,
    /// Hash of the preceding entry.
    pub previous_hash: String,
}
