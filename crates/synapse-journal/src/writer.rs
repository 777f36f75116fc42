//! Journal writer implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for journal writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
        }
    }
}

/// Append-only writer.
///
/// A journal is never rewritten: existing files are validated and then only
/// extended at the end.
///
/// ```rust,no_run
/// use synapse_journal::{JournalWriter, WriteOptions};
/// use serde_json::json;
///
/// let mut writer = JournalWriter::open("ledger.sgl", WriteOptions::default())?;
/// writer.append_record(&json!({"index": 1}))?;
/// writer.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalWriter<F: JournalFile = File> {
    file: F,
    sync: bool,
    failed: bool,
}

/// Storage a [`JournalWriter`] appends to.
pub trait JournalFile: Write {
    /// Current length in bytes.
    fn byte_len(&self) -> io::Result<u64>;
    /// Cuts the file back to `len` bytes and positions writes at the new end.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    /// Forces written data to stable storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(io::SeekFrom::Start(len))?;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl JournalWriter<File> {
    /// Opens or creates a journal file for appending.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the file cannot be opened, or if an
    /// existing file does not start with a valid header.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let mut file = OpenOptions::new()
            .create(options.create)
            .read(true)
            .write(true)
            .open(path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&JournalHeader::new().to_bytes())?;
            file.flush()?;
            if options.sync {
                file.sync_all()?;
            }
        } else if len < JournalHeader::HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header_bytes = [0u8; JournalHeader::HEADER_SIZE];
            file.seek(io::SeekFrom::Start(0))?;
            file.read_exact(&mut header_bytes)?;
            JournalHeader::from_bytes(&header_bytes)?;
            file.seek(io::SeekFrom::End(0))?;
        }

        Ok(Self {
            file,
            sync: options.sync,
            failed: false,
        })
    }
}

impl<F: JournalFile> JournalWriter<F> {
    /// Serializes `record` as JSON and appends it as a ledger-entry frame.
    pub fn append_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<(), JournalError> {
        let json_bytes = serde_json::to_vec(record)?;
        self.append_raw(FrameKind::LedgerEntry, &json_bytes)
    }

    /// Appends a raw frame with the given kind and payload.
    ///
    /// A failed append is rolled back to the previous end of file, so later
    /// frames never follow a partial one. If the rollback itself fails the
    /// writer refuses every further append.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        if self.failed {
            return Err(JournalError::WriterFailed);
        }
        let frame = RecordFrame::new(kind, payload.len())?;

        // Header and payload go out in one write so a crash leaves at most a
        // truncated tail, which permissive readers treat as end-of-file.
        let mut buf = Vec::with_capacity(RecordFrame::FRAME_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&frame.to_bytes());
        buf.extend_from_slice(payload);

        let end = self.file.byte_len()?;
        if let Err(err) = self.write_frame(&buf) {
            if self.file.truncate_to(end).is_err() {
                self.failed = true;
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn write_frame(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)?;
        self.file.flush()?;
        if self.sync {
            self.file.sync()?;
        }
        Ok(())
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync()?;
        }
        Ok(())
    }
}

impl<F: JournalFile> Drop for JournalWriter<F> {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory file that accepts `budget` more bytes, then fails mid-write.
    #[derive(Default)]
    struct FlakyFile {
        bytes: Vec<u8>,
        budget: Option<usize>,
        truncate_fails: bool,
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.budget {
                Some(0) => Err(io::Error::new(io::ErrorKind::Other, "no space left")),
                Some(left) => {
                    let n = left.min(buf.len());
                    self.bytes.extend_from_slice(&buf[..n]);
                    self.budget = Some(left - n);
                    Ok(n)
                }
                None => {
                    self.bytes.extend_from_slice(buf);
                    Ok(buf.len())
                }
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl JournalFile for FlakyFile {
        fn byte_len(&self) -> io::Result<u64> {
            Ok(self.bytes.len() as u64)
        }

        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            if self.truncate_fails {
                return Err(io::Error::new(io::ErrorKind::Other, "truncate failed"));
            }
            self.bytes.truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn writer(file: FlakyFile) -> JournalWriter<FlakyFile> {
        JournalWriter {
            file,
            sync: false,
            failed: false,
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = RecordFrame::new(FrameKind::LedgerEntry, payload.len())
            .unwrap()
            .to_bytes()
            .to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn partial_write_is_rolled_back() {
        let mut w = writer(FlakyFile::default());
        w.append_raw(FrameKind::LedgerEntry, b"{\"index\":0}").unwrap();

        w.file.budget = Some(5);
        assert!(w.append_raw(FrameKind::LedgerEntry, b"{\"index\":1}").is_err());
        assert_eq!(w.file.bytes, frame(b"{\"index\":0}"));

        w.file.budget = None;
        w.append_raw(FrameKind::LedgerEntry, b"{\"index\":1}").unwrap();
        let mut expected = frame(b"{\"index\":0}");
        expected.extend(frame(b"{\"index\":1}"));
        assert_eq!(w.file.bytes, expected);
    }

    #[test]
    fn failed_rollback_stops_the_writer() {
        let mut w = writer(FlakyFile {
            budget: Some(3),
            truncate_fails: true,
            ..FlakyFile::default()
        });
        assert!(w.append_raw(FrameKind::LedgerEntry, b"{}").is_err());

        w.file.budget = None;
        assert!(matches!(
            w.append_raw(FrameKind::LedgerEntry, b"{}"),
            Err(JournalError::WriterFailed)
        ));
        assert_eq!(w.file.bytes.len(), 3);
    }
}
