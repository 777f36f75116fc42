//! Append-only, SHA-256 hash-chained audit ledger.
//!
//! Every entry commits to its predecessor's hash, so changing any field of a
//! past entry invalidates every hash after it. The ledger never repairs a
//! broken chain: [`AuditLedger::verify_chain`] reports the first failing
//! index and callers treat that as a hard integrity failure.
//!
//! Appends are serialized behind a write lock that covers index assignment,
//! hashing, persistence and publication. Readers take the read lock only long
//! enough to clone the entries they need.

mod entry;
mod sink;

pub use entry::{LedgerEntry, LedgerEvent, SnapshotEntry};
pub use sink::{read_journal, JournalSink, LedgerSink};

use crate::clock::{Clock, SystemClock};
use crate::decision::SCHEMA_VERSION;
use crate::errors::LedgerError;
use crate::signer::Signer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use synapse_canonical::{Timestamp, GENESIS_HASH};
use synapse_journal::WriteOptions;
use tracing::{debug, warn};

/// Result of walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    /// Whether every entry passed.
    pub is_valid: bool,
    /// Last index that passed; `None` when genesis itself fails.
    pub last_valid_index: Option<u64>,
    /// First index that failed.
    pub broken_index: Option<u64>,
    /// Number of entries examined.
    pub total_entries: u64,
}

/// Read-only status payload for integrity endpoints. Never carries entry data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatus {
    /// Status was produced.
    pub ok: bool,
    /// Hash of the genesis entry.
    pub ledger_root_hash: Option<String>,
    /// Hash of the newest entry.
    pub last_entry_hash: Option<String>,
    /// Number of entries including genesis.
    pub chain_length: u64,
    /// Result of a full chain verification.
    pub is_valid: bool,
    /// When the status was taken.
    pub fetched_at: Timestamp,
}

impl LedgerStatus {
    /// Status of `entries` as of `fetched_at`.
    pub fn from_entries(entries: &[LedgerEntry], fetched_at: DateTime<Utc>) -> Self {
        Self {
            ok: true,
            ledger_root_hash: entries.first().map(|e| e.hash.clone()),
            last_entry_hash: entries.last().map(|e| e.hash.clone()),
            chain_length: entries.len() as u64,
            is_valid: verify_entries(entries).is_valid,
            fetched_at: Timestamp::from_datetime(fetched_at),
        }
    }
}

/// Fixed payload of entry 0.
pub fn genesis_data() -> Value {
    json!({"message": "GENESIS", "schemaVersion": SCHEMA_VERSION})
}

/// Walks `entries` from genesis and reports the first failing index.
///
/// Entry 0 must carry `GENESIS_HASH` as its previous hash, the fixed genesis
/// payload and a correct hash. Every later entry must sit at its own index,
/// point at its predecessor's hash and hash correctly.
pub fn verify_entries(entries: &[LedgerEntry]) -> ChainVerification {
    let total_entries = entries.len() as u64;
    let mut last_valid_index = None;
    let mut expected_previous = GENESIS_HASH;

    for (position, entry) in entries.iter().enumerate() {
        let position = position as u64;
        let linked = entry.index == position && entry.previous_hash == expected_previous;
        let genesis_ok = position != 0
            || (entry.event == LedgerEvent::SystemEvent && entry.data == genesis_data());
        let hashed = matches!(entry.recompute_hash(), Ok(ref hash) if *hash == entry.hash);

        if !(linked && genesis_ok && hashed) {
            return ChainVerification {
                is_valid: false,
                last_valid_index,
                broken_index: Some(position),
                total_entries,
            };
        }
        last_valid_index = Some(position);
        expected_previous = entry.hash.as_str();
    }

    ChainVerification {
        is_valid: !entries.is_empty(),
        last_valid_index,
        broken_index: if entries.is_empty() { Some(0) } else { None },
        total_entries,
    }
}

struct ChainState {
    entries: Vec<LedgerEntry>,
    sink: Option<Box<dyn LedgerSink>>,
}

/// The audit ledger.
///
/// Holds no key material itself: signing is delegated to the injected
/// [`Signer`].
pub struct AuditLedger {
    state: RwLock<ChainState>,
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLedger")
            .field("len", &self.len())
            .field("signer_id", &self.signer.signer_id())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuditLedger`].
pub struct AuditLedgerBuilder {
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
    sink: Option<Box<dyn LedgerSink>>,
    entries: Vec<LedgerEntry>,
}

impl AuditLedgerBuilder {
    /// Replaces the wall clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persists every new entry through `sink`.
    pub fn sink(mut self, sink: Box<dyn LedgerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Starts from previously persisted entries instead of a fresh genesis.
    ///
    /// Entries are taken as-is; a broken chain stays broken.
    pub fn restore(mut self, entries: Vec<LedgerEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Builds the ledger, writing genesis if no entries were restored.
    pub fn build(self) -> Result<AuditLedger, LedgerError> {
        let mut state = ChainState {
            entries: self.entries,
            sink: self.sink,
        };
        if state.entries.is_empty() {
            let timestamp = Timestamp::from_datetime(self.clock.now());
            let data = genesis_data();
            let hash = LedgerEntry::compute_hash(
                0,
                &timestamp,
                LedgerEvent::SystemEvent,
                &data,
                GENESIS_HASH,
            )?;
            let genesis = LedgerEntry {
                index: 0,
                timestamp,
                event: LedgerEvent::SystemEvent,
                data,
                hash,
                previous_hash: GENESIS_HASH.to_string(),
            };
            if let Some(sink) = state.sink.as_mut() {
                sink.persist(&genesis)?;
            }
            state.entries.push(genesis);
        }
        Ok(AuditLedger {
            state: RwLock::new(state),
            signer: self.signer,
            clock: self.clock,
        })
    }
}

impl AuditLedger {
    /// In-memory ledger holding only genesis.
    pub fn new(signer: Arc<dyn Signer>) -> Result<Self, LedgerError> {
        Self::builder(signer).build()
    }

    /// Starts a builder with the system clock and no sink.
    pub fn builder(signer: Arc<dyn Signer>) -> AuditLedgerBuilder {
        AuditLedgerBuilder {
            signer,
            clock: Arc::new(SystemClock),
            sink: None,
            entries: Vec::new(),
        }
    }

    /// In-memory ledger over previously persisted entries.
    pub fn restore(entries: Vec<LedgerEntry>, signer: Arc<dyn Signer>) -> Result<Self, LedgerError> {
        Self::builder(signer).restore(entries).build()
    }

    /// Appends an entry and returns it.
    ///
    /// The entry is visible to readers only after the sink (if any) has
    /// accepted it. A sink failure leaves the chain unchanged.
    pub fn append(&self, event: LedgerEvent, data: Value) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;

        let index = state.entries.len() as u64;
        let previous_hash = state
            .entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let timestamp = Timestamp::from_datetime(self.clock.now());
        let hash = LedgerEntry::compute_hash(index, &timestamp, event, &data, &previous_hash)?;

        let entry = LedgerEntry {
            index,
            timestamp,
            event,
            data,
            hash,
            previous_hash,
        };
        if let Some(sink) = state.sink.as_mut() {
            sink.persist(&entry)?;
        }
        state.entries.push(entry.clone());

        debug!(index, event = %event, hash = %entry.hash, "ledger entry appended");
        Ok(entry)
    }

    /// Verifies the whole chain.
    pub fn verify_chain(&self) -> ChainVerification {
        let entries = self.chain();
        let verification = verify_entries(&entries);
        if !verification.is_valid {
            warn!(
                broken_index = ?verification.broken_index,
                total_entries = verification.total_entries,
                "audit chain integrity check failed"
            );
        }
        verification
    }

    /// Signs `payload` with the injected signer.
    pub fn sign(&self, payload: &str) -> String {
        self.signer.sign(payload)
    }

    /// Verifies `signature` over `payload` with the injected signer.
    pub fn verify_signature(&self, payload: &str, signature: &str) -> bool {
        self.signer.verify(payload, signature)
    }

    /// Every entry with `data` stripped.
    pub fn export_snapshot(&self) -> Vec<SnapshotEntry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.iter().map(LedgerEntry::redacted).collect()
    }

    /// Copy of all entries.
    pub fn chain(&self) -> Vec<LedgerEntry> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    /// Number of entries including genesis.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Always false once built; genesis is written at construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry whose hash is `hash`.
    pub fn find_by_hash(&self, hash: &str) -> Option<LedgerEntry> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .find(|e| e.hash == hash)
            .cloned()
    }

    /// Newest entry.
    pub fn last_entry(&self) -> Option<LedgerEntry> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .last()
            .cloned()
    }

    /// Hash of the genesis entry.
    pub fn root_hash(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .first()
            .map(|e| e.hash.clone())
    }

    /// Status payload for integrity endpoints.
    pub fn status(&self) -> LedgerStatus {
        LedgerStatus::from_entries(&self.chain(), self.clock.now())
    }

    /// Identifier of the injected signer.
    pub fn signer_id(&self) -> String {
        self.signer.signer_id()
    }

    /// The injected signer.
    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

/// Opens the journal at `path` and restores a ledger from it.
///
/// A missing or empty file starts a new chain whose genesis is written to
/// the journal. New entries are appended to the same file.
pub fn load_ledger<P: AsRef<Path>>(
    path: P,
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
    options: WriteOptions,
) -> Result<AuditLedger, LedgerError> {
    let path = path.as_ref();
    let has_entries = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    let entries = if has_entries {
        read_journal(path)?
    } else {
        Vec::new()
    };
    let sink = JournalSink::open(path, options)?;
    AuditLedger::builder(signer)
        .clock(clock)
        .sink(Box::new(sink))
        .restore(entries)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::signer::HmacSigner;
    use chrono::TimeZone;

    fn signer() -> Arc<dyn Signer> {
        Arc::new(HmacSigner::from_seed("ledger-test").unwrap())
    }

    fn ledger() -> AuditLedger {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        AuditLedger::builder(signer())
            .clock(Arc::new(clock))
            .build()
            .unwrap()
    }

    struct FailingSink;

    impl LedgerSink for FailingSink {
        fn persist(&mut self, _entry: &LedgerEntry) -> Result<(), LedgerError> {
            Err(LedgerError::Poisoned)
        }
    }

    struct CountingSink(Arc<std::sync::atomic::AtomicUsize>);

    impl LedgerSink for CountingSink {
        fn persist(&mut self, _entry: &LedgerEntry) -> Result<(), LedgerError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn new_ledger_holds_valid_genesis() {
        let ledger = ledger();
        let chain = ledger.chain();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].previous_hash, GENESIS_HASH);
        assert_eq!(chain[0].event, LedgerEvent::SystemEvent);
        assert_eq!(chain[0].data, genesis_data());
        let verification = ledger.verify_chain();
        assert!(verification.is_valid);
        assert_eq!(verification.last_valid_index, Some(0));
        assert_eq!(verification.total_entries, 1);
    }

    #[test]
    fn appends_are_dense_and_linked() {
        let ledger = ledger();
        let a = ledger.append(LedgerEvent::SystemEvent, json!({"n": 1})).unwrap();
        let b = ledger.append(LedgerEvent::GateVerification, json!({"n": 2})).unwrap();
        assert_eq!(a.index, 1);
        assert_eq!(b.index, 2);
        assert_eq!(b.previous_hash, a.hash);
        assert_eq!(ledger.last_entry().unwrap(), b);
        assert!(ledger.verify_chain().is_valid);
    }

    #[test]
    fn tampered_data_is_reported_at_its_index() {
        let ledger = ledger();
        for n in 0..4 {
            ledger.append(LedgerEvent::SystemEvent, json!({"n": n})).unwrap();
        }
        let mut entries = ledger.chain();
        entries[2].data = json!({"n": "forged"});
        let verification = verify_entries(&entries);
        assert!(!verification.is_valid);
        assert_eq!(verification.broken_index, Some(2));
        assert_eq!(verification.last_valid_index, Some(1));
    }

    #[test]
    fn tampered_genesis_is_reported_at_zero() {
        let mut entries = ledger().chain();
        entries[0].data = json!({"message": "NOT GENESIS"});
        let verification = verify_entries(&entries);
        assert_eq!(verification.broken_index, Some(0));
        assert_eq!(verification.last_valid_index, None);
    }

    #[test]
    fn empty_chain_is_invalid() {
        let verification = verify_entries(&[]);
        assert!(!verification.is_valid);
        assert_eq!(verification.total_entries, 0);
    }

    #[test]
    fn snapshot_strips_data() {
        let ledger = ledger();
        ledger.append(LedgerEvent::SystemEvent, json!({"secret": true})).unwrap();
        let snapshot = serde_json::to_string(&ledger.export_snapshot()).unwrap();
        assert!(!snapshot.contains("secret"));
        assert_eq!(ledger.export_snapshot().len(), 2);
    }

    #[test]
    fn status_reports_root_and_tip() {
        let ledger = ledger();
        let tip = ledger.append(LedgerEvent::SystemEvent, json!({})).unwrap();
        let status = ledger.status();
        assert!(status.ok);
        assert!(status.is_valid);
        assert_eq!(status.chain_length, 2);
        assert_eq!(status.ledger_root_hash, ledger.root_hash());
        assert_eq!(status.last_entry_hash, Some(tip.hash));
        assert_eq!(status.fetched_at.as_str(), "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn sink_failure_leaves_chain_unchanged() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let ledger = AuditLedger::builder(signer())
            .sink(Box::new(CountingSink(counter.clone())))
            .build()
            .unwrap();
        ledger.append(LedgerEvent::SystemEvent, json!({})).unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);

        let restored = AuditLedger::builder(signer())
            .sink(Box::new(FailingSink))
            .restore(ledger.chain())
            .build()
            .unwrap();
        assert!(restored.append(LedgerEvent::SystemEvent, json!({})).is_err());
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn restored_ledger_continues_the_chain() {
        let original = ledger();
        original.append(LedgerEvent::SystemEvent, json!({"n": 1})).unwrap();
        let restored = AuditLedger::restore(original.chain(), signer()).unwrap();
        let next = restored.append(LedgerEvent::SystemEvent, json!({"n": 2})).unwrap();
        assert_eq!(next.index, 2);
        assert!(restored.verify_chain().is_valid);
    }

    #[test]
    fn signing_delegates_to_signer() {
        let ledger = ledger();
        let sig = ledger.sign("payload");
        assert!(ledger.verify_signature("payload", &sig));
        assert!(!ledger.verify_signature("other", &sig));
        assert!(ledger.signer_id().starts_with("hmac:"));
    }

    #[test]
    fn concurrent_appends_keep_chain_valid() {
        let ledger = Arc::new(AuditLedger::new(signer()).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for n in 0..25 {
                        ledger
                            .append(LedgerEvent::SystemEvent, json!({"thread": t, "n": n}))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let verification = ledger.verify_chain();
        assert!(verification.is_valid);
        assert_eq!(verification.total_entries, 201);
    }
}
