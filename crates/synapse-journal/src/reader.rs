//! Journal reader implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame};
use crate::record::RecordJson;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read mode for handling truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Truncated frames are errors.
    Strict,
    /// A truncated tail is treated as end-of-file (a crash mid-append).
    Permissive,
}

/// Sequential reader over a journal file.
///
/// ```rust,no_run
/// use synapse_journal::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("ledger.sgl", ReadMode::Strict)?;
/// while let Some(record) = reader.read_json()? {
///     println!("entry {}", record["index"]);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    inner: BufReader<File>,
    mode: ReadMode,
    position: u64,
    file_size: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the file cannot be opened or the header is
    /// invalid.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut inner = BufReader::new(file);

        let mut header_bytes = [0u8; JournalHeader::HEADER_SIZE];
        inner.read_exact(&mut header_bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                JournalError::InvalidHeader(format!("header too short: {} bytes", file_size))
            } else {
                e.into()
            }
        })?;
        JournalHeader::from_bytes(&header_bytes)?;

        Ok(Self {
            inner,
            mode,
            position: JournalHeader::HEADER_SIZE as u64,
            file_size,
        })
    }

    /// Current byte offset in the file.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn truncated(&self, offset: u64) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }

    /// Reads the next raw frame. Returns `Ok(None)` at end-of-file.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        if self.position >= self.file_size {
            return Ok(None);
        }

        let frame_offset = self.position;
        let mut frame_header = [0u8; RecordFrame::FRAME_HEADER_SIZE];
        match self.inner.read_exact(&mut frame_header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return self.truncated(frame_offset),
            Err(e) => return Err(e.into()),
        }
        let frame = RecordFrame::from_bytes(&frame_header, frame_offset)?;
        self.position += RecordFrame::FRAME_HEADER_SIZE as u64;

        let mut payload = vec![0u8; frame.len as usize];
        match self.inner.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return self.truncated(frame_offset),
            Err(e) => return Err(e.into()),
        }
        self.position += u64::from(frame.len);

        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next ledger-entry record as raw JSON, skipping unknown kinds.
    pub fn read_json(&mut self) -> Result<Option<RecordJson>, JournalError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::LedgerEntry, payload)) => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                Some((FrameKind::Unknown(_), _)) => continue,
            }
        }
    }

    /// Reads the next record and deserializes it into `T`.
    pub fn read_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>, JournalError> {
        match self.read_json()? {
            None => Ok(None),
            Some(json) => Ok(Some(serde_json::from_value(json)?)),
        }
    }

    /// Reads every remaining record into `T`.
    pub fn read_all<T: DeserializeOwned>(&mut self) -> Result<Vec<T>, JournalError> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok(records)
    }
}
