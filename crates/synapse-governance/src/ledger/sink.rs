use super::entry::LedgerEntry;
use crate::errors::LedgerError;
use std::path::Path;
use synapse_journal::{JournalReader, JournalWriter, ReadMode, WriteOptions};

/// Durable destination for appended entries.
///
/// The ledger calls [`LedgerSink::persist`] while holding its write lock and
/// only publishes the entry in memory once the sink has accepted it.
pub trait LedgerSink: Send + Sync {
    /// Persists one entry.
    fn persist(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError>;
}

/// Sink writing each entry as a JSON frame to an `.sgl` journal.
pub struct JournalSink {
    writer: JournalWriter,
}

impl JournalSink {
    /// Opens or creates the journal at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, LedgerError> {
        Ok(Self {
            writer: JournalWriter::open(path, options)?,
        })
    }
}

impl LedgerSink for JournalSink {
    fn persist(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        self.writer.append_record(entry)?;
        Ok(())
    }
}

/// Reads every entry from a journal, failing on truncated frames.
///
/// No chain verification is performed; restored ledgers report breaks
/// through `verify_chain`.
pub fn read_journal<P: AsRef<Path>>(path: P) -> Result<Vec<LedgerEntry>, LedgerError> {
    let mut reader = JournalReader::open(path, ReadMode::Strict)?;
    Ok(reader.read_all()?)
}
