use crate::errors::JournalError;

/// Journal file magic bytes: `b"SGL1"`.
pub const MAGIC: &[u8; 4] = b"SGL1";

/// Current journal format version: `0x0001`.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum payload size: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Record frame kind: a serialized ledger entry.
pub const FRAME_KIND_LEDGER_ENTRY: u8 = 0x01;

/// Journal file header (16 bytes).
///
/// Layout: magic (4) | version u16 LE | flags u16 LE | reserved (8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalHeader {
    /// Magic bytes: `"SGL1"`.
    pub magic: [u8; 4],
    /// Format version.
    pub version: u16,
    /// Reserved flags (must be 0).
    pub flags: u16,
    /// Reserved bytes (must be all zeros).
    pub reserved: [u8; 8],
}

impl JournalHeader {
    /// Header size constant.
    pub const HEADER_SIZE: usize = HEADER_SIZE;

    /// Creates a header for the current format version.
    pub fn new() -> Self {
        Self {
            magic: *MAGIC,
            version: VERSION,
            flags: 0,
            reserved: [0; 8],
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.reserved);
        bytes
    }

    /// Deserializes and validates a header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JournalError> {
        if bytes.len() < HEADER_SIZE {
            return Err(JournalError::InvalidHeader(format!(
                "header too short: {} bytes",
                bytes.len()
            )));
        }

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != *MAGIC {
            return Err(JournalError::InvalidHeader(format!(
                "invalid magic: {:?}, expected {:?}",
                magic, MAGIC
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(JournalError::InvalidHeader(format!(
                "unsupported version: 0x{:04x}, expected 0x{:04x}",
                version, VERSION
            )));
        }

        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        if flags != 0 {
            return Err(JournalError::InvalidHeader(format!(
                "non-zero flags: 0x{:04x}",
                flags
            )));
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&bytes[8..16]);
        if reserved != [0u8; 8] {
            return Err(JournalError::InvalidHeader(
                "non-zero reserved bytes".to_string(),
            ));
        }

        Ok(Self {
            magic,
            version,
            flags,
            reserved,
        })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Record frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 JSON object holding one ledger entry.
    LedgerEntry,
    /// Unknown kind; readers skip it.
    Unknown(u8),
}

impl FrameKind {
    /// Creates a kind from its byte value.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            FRAME_KIND_LEDGER_ENTRY => FrameKind::LedgerEntry,
            _ => FrameKind::Unknown(byte),
        }
    }

    /// Returns the byte value for this kind.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::LedgerEntry => FRAME_KIND_LEDGER_ENTRY,
            FrameKind::Unknown(b) => b,
        }
    }
}

/// Record frame header (8 bytes): kind | reserved (3) | len u32 LE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl RecordFrame {
    /// Frame header size constant.
    pub const FRAME_HEADER_SIZE: usize = FRAME_HEADER_SIZE;

    /// Creates a frame header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        if len > MAX_PAYLOAD_SIZE as usize {
            return Err(JournalError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            kind,
            len: len as u32,
        })
    }

    /// Serializes the frame header to bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.kind.to_byte();
        bytes[4..8].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    /// Deserializes a frame header found at `offset`.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, JournalError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(JournalError::InvalidFrame {
                offset,
                reason: format!("frame header too short: {} bytes", bytes.len()),
            });
        }
        if bytes[1..4] != [0u8; 3] {
            return Err(JournalError::InvalidFrame {
                offset,
                reason: "non-zero reserved bytes".to_string(),
            });
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(JournalError::InvalidFrame {
                offset,
                reason: format!("payload size {} exceeds maximum {}", len, MAX_PAYLOAD_SIZE),
            });
        }

        Ok(Self {
            kind: FrameKind::from_byte(bytes[0]),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = JournalHeader::new();
        let restored = JournalHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(header, restored);
    }

    #[test]
    fn header_rejects_foreign_magic() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[0..4].copy_from_slice(b"NRJ1");
        let err = JournalHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn header_rejects_future_version() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[4] = 0x02;
        let err = JournalHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn header_rejects_flags_and_reserved() {
        let mut flagged = JournalHeader::new().to_bytes();
        flagged[6] = 0x01;
        assert!(JournalHeader::from_bytes(&flagged).is_err());

        let mut reserved = JournalHeader::new().to_bytes();
        reserved[15] = 0x01;
        assert!(JournalHeader::from_bytes(&reserved).is_err());
    }

    #[test]
    fn frame_round_trip() {
        let frame = RecordFrame::new(FrameKind::LedgerEntry, 1024).unwrap();
        let restored = RecordFrame::from_bytes(&frame.to_bytes(), 16).unwrap();
        assert_eq!(frame, restored);
    }

    #[test]
    fn frame_rejects_oversized_payload() {
        let err = RecordFrame::new(FrameKind::LedgerEntry, MAX_PAYLOAD_SIZE as usize + 1).unwrap_err();
        assert!(matches!(err, JournalError::PayloadTooLarge { .. }));
    }

    #[test]
    fn frame_error_reports_offset() {
        let mut bytes = RecordFrame::new(FrameKind::LedgerEntry, 10).unwrap().to_bytes();
        bytes[2] = 0x01;
        match RecordFrame::from_bytes(&bytes, 99) {
            Err(JournalError::InvalidFrame { offset, .. }) => assert_eq!(offset, 99),
            other => panic!("expected InvalidFrame, got {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_keeps_its_byte() {
        assert_eq!(FrameKind::from_byte(0x7f).to_byte(), 0x7f);
    }
}
