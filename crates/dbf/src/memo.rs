//! Memo store reading.
//!
//! Memo fields hold a block number into a companion file. The FoxPro layout
//! is supported:
//!
//! | Offset | Field        | Type    | Description                       |
//! |--------|--------------|---------|-----------------------------------|
//! | 0-3    | next block   | BE u32  | Next free block                   |
//! | 6-7    | block size   | BE u16  | Bytes per block                   |
//! | 0-511  | header       | -       | Occupies block 0 (and more)       |
//!
//! Each memo starts at `block * block_size` with an 8-byte record header:
//! a big-endian type (0 picture, 1 text, 2 object) and a big-endian payload
//! length, followed by the payload.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::charset::TextEncoding;
use crate::error::{DbfError, Result};
use crate::header::read_fully;

/// Memo file header length.
pub const MEMO_HEADER_LEN: usize = 0x200;

/// Memo record header length (type and length).
pub const MEMO_RECORD_HEADER_LEN: usize = 8;

/// Resolves memo block numbers to their contents.
///
/// Records share one source; implementations serialize access internally.
pub trait MemoSource: Send + Sync {
    /// Read the memo stored at `block` (never 0).
    fn read(&self, block: u32) -> Result<MemoRecord>;
}

/// What a memo block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    /// Picture (type 0).
    Picture,
    /// Text (type 1).
    Text,
    /// OLE object (type 2).
    Object,
    /// Any other type word.
    Other(u32),
}

impl MemoKind {
    /// Interpret the record header's type word.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Picture,
            1 => Self::Text,
            2 => Self::Object,
            other => Self::Other(other),
        }
    }

    /// Type word for the record header.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Picture => 0,
            Self::Text => 1,
            Self::Object => 2,
            Self::Other(value) => value,
        }
    }
}

/// One memo value read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoRecord {
    block: u32,
    kind: MemoKind,
    bytes: Vec<u8>,
}

impl MemoRecord {
    /// Create a memo value.
    #[must_use]
    pub fn new(block: u32, kind: MemoKind, bytes: Vec<u8>) -> Self {
        Self { block, kind, bytes }
    }

    /// Block the memo was read from.
    #[must_use]
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Memo kind.
    #[must_use]
    pub fn kind(&self) -> MemoKind {
        self.kind
    }

    /// Raw payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the raw payload.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Payload decoded with `encoding`; malformed sequences become U+FFFD.
    #[must_use]
    pub fn text(&self, encoding: &TextEncoding) -> String {
        encoding.decode(&self.bytes)
    }
}

/// Memo store over any seekable byte source.
#[derive(Debug)]
pub struct MemoReader<R> {
    inner: Mutex<R>,
    block_size: u32,
    next_free_block: u32,
}

impl MemoReader<BufReader<File>> {
    /// Open a memo file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DbfError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DbfError::Io(e)
            }
        })?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> MemoReader<R> {
    /// Read the memo header and wrap the source.
    ///
    /// # Errors
    /// Returns [`DbfError::Corrupted`] if the header is short or the block size is zero.
    pub fn new(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; MEMO_HEADER_LEN];
        let read = read_fully(&mut reader, &mut header)?;
        if read < MEMO_HEADER_LEN {
            return Err(DbfError::corrupted(format!(
                "memo header is {read} bytes, expected {MEMO_HEADER_LEN}"
            )));
        }

        let next_free_block = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let block_size = u32::from(u16::from_be_bytes([header[6], header[7]]));
        if block_size == 0 {
            return Err(DbfError::corrupted("memo block size is zero"));
        }
        tracing::debug!(block_size, next_free_block, "opened memo store");

        Ok(Self {
            inner: Mutex::new(reader),
            block_size,
            next_free_block,
        })
    }

    /// Bytes per block.
    #[must_use]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Next free block recorded in the header.
    #[must_use]
    pub fn next_free_block(&self) -> u32 {
        self.next_free_block
    }

    /// Read the memo stored at `block`.
    ///
    /// # Errors
    /// Returns [`DbfError::InvalidMemoBlock`] for block 0 or a payload that
    /// runs past the end of the store.
    pub fn read_block(&self, block: u32) -> Result<MemoRecord> {
        if block == 0 {
            return Err(DbfError::InvalidMemoBlock {
                block,
                message: "block 0 holds the memo header".to_string(),
            });
        }
        let position = u64::from(block) * u64::from(self.block_size);

        let mut reader = self.inner.lock().map_err(|_| DbfError::LockPoisoned)?;
        reader.seek(SeekFrom::Start(position))?;

        let mut header = [0u8; MEMO_RECORD_HEADER_LEN];
        if read_fully(&mut *reader, &mut header)? < MEMO_RECORD_HEADER_LEN {
            return Err(DbfError::InvalidMemoBlock {
                block,
                message: format!("no record header at byte {position}"),
            });
        }
        let kind = MemoKind::from_u32(u32::from_be_bytes([
            header[0], header[1], header[2], header[3],
        ]));
        let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut bytes = Vec::new();
        let read = (&mut *reader)
            .take(u64::from(length))
            .read_to_end(&mut bytes)?;
        if read < length as usize {
            return Err(DbfError::InvalidMemoBlock {
                block,
                message: format!("payload declares {length} bytes, {read} available"),
            });
        }

        tracing::trace!(block, ?kind, length, "read memo block");
        Ok(MemoRecord::new(block, kind, bytes))
    }

    /// Release the underlying source.
    pub fn into_inner(self) -> Result<R> {
        self.inner.into_inner().map_err(|_| DbfError::LockPoisoned)
    }
}

impl<R: Read + Seek + Send> MemoSource for MemoReader<R> {
    fn read(&self, block: u32) -> Result<MemoRecord> {
        self.read_block(block)
    }
}
