//! Tag dump assembly
//!
//! Normalizes Flipper (text) and Proxmark (binary or JSON) captures into a
//! [`TagDump`]: an indexable set of 16-byte blocks bounded by the capacity of
//! a MIFARE Classic 1K tag.
//!
//! Assembly is tolerant. Truncated files, gaps, duplicate or garbled block
//! lines are recorded as [`DumpIssue`]s and decoding carries on with whatever
//! blocks survived. Only a dump with zero usable blocks is an error.

pub mod flipper;
pub mod proxmark;

use serde::Serialize;
use thiserror::Error;

/// Bytes per block
pub const BLOCK_SIZE: usize = 16;

/// Blocks on a MIFARE Classic 1K tag
pub const TAG_CAPACITY: usize = 64;

/// Errors that abort decoding of a dump
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Unrecognized dump format: {0}")]
    UnrecognizedFormat(String),

    #[error("Malformed {format} dump: {reason}")]
    MalformedDump { format: DumpFormat, reason: String },
}

/// Capture format of a dump file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// Flipper Zero `.nfc` text dump (`Block N: XX XX ...` lines)
    Flipper,
    /// Proxmark3 dump, raw binary blocks or the JSON export
    Proxmark,
}

impl DumpFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DumpFormat::Flipper => "flipper",
            DumpFormat::Proxmark => "proxmark",
        }
    }
}

impl std::fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-fatal problems found while assembling a dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DumpIssue {
    /// Binary dump length was not a whole number of blocks
    Truncated { trailing_bytes: usize },
    /// Block index seen more than once; the last occurrence was kept
    DuplicateBlock { index: usize },
    /// Block index beyond the tag capacity; the block was dropped
    BlockOutOfRange { index: usize },
    /// Binary dump held more blocks than the tag capacity
    ExcessBlocks { dropped: usize },
    /// A block entry could not be parsed and was skipped
    InvalidBlock { entry: String, reason: String },
}

impl std::fmt::Display for DumpIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { trailing_bytes } => {
                write!(f, "truncated: {} trailing bytes ignored", trailing_bytes)
            }
            Self::DuplicateBlock { index } => {
                write!(f, "block {} appears more than once, last value kept", index)
            }
            Self::BlockOutOfRange { index } => {
                write!(f, "block {} is beyond tag capacity {}", index, TAG_CAPACITY)
            }
            Self::ExcessBlocks { dropped } => {
                write!(f, "{} blocks beyond tag capacity ignored", dropped)
            }
            Self::InvalidBlock { entry, reason } => write!(f, "{}: {}", entry, reason),
        }
    }
}

/// One 16-byte block
///
/// Flipper dumps mark bytes the reader could not authenticate with `??`.
/// Those bytes are tracked in a mask and any field overlapping them is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    bytes: [u8; BLOCK_SIZE],
    unread: u16,
}

impl Block {
    pub fn new(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { bytes, unread: 0 }
    }

    /// Build a block from a slice of exactly [`BLOCK_SIZE`] bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; BLOCK_SIZE] = bytes.try_into().ok()?;
        Some(Self::new(bytes))
    }

    /// Build a block where bit `i` of `unread` marks byte `i` as unknown
    pub fn with_unread(bytes: [u8; BLOCK_SIZE], unread: u16) -> Self {
        Self { bytes, unread }
    }

    pub fn bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    pub fn is_unread(&self, index: usize) -> bool {
        index < BLOCK_SIZE && self.unread & (1 << index) != 0
    }

    /// Bytes `offset..offset + width`, or `None` if out of bounds or any byte is unread
    pub fn range(&self, offset: usize, width: usize) -> Option<&[u8]> {
        let end = offset.checked_add(width)?;
        if end > BLOCK_SIZE {
            return None;
        }
        if (offset..end).any(|i| self.is_unread(i)) {
            return None;
        }
        Some(&self.bytes[offset..end])
    }
}

/// Card identification captured alongside the blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagHeader {
    pub uid: Option<String>,
    pub atqa: Option<String>,
    pub sak: Option<String>,
    pub card_type: Option<String>,
}

/// A normalized tag dump
#[derive(Debug, Clone)]
pub struct TagDump {
    pub format: DumpFormat,
    pub header: TagHeader,
    pub issues: Vec<DumpIssue>,
    blocks: Vec<Option<Block>>,
}

impl TagDump {
    pub fn new(format: DumpFormat) -> Self {
        Self {
            format,
            header: TagHeader::default(),
            issues: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Place a block at its index, recording duplicates and out-of-range indices
    pub fn insert(&mut self, index: usize, block: Block) {
        if index >= TAG_CAPACITY {
            tracing::warn!(index, "dropping block beyond tag capacity");
            self.issues.push(DumpIssue::BlockOutOfRange { index });
            return;
        }
        if self.blocks.len() <= index {
            self.blocks.resize(index + 1, None);
        }
        if self.blocks[index].replace(block).is_some() {
            tracing::warn!(index, "duplicate block, keeping last value");
            self.issues.push(DumpIssue::DuplicateBlock { index });
        }
    }

    pub(crate) fn flag(&mut self, issue: DumpIssue) {
        tracing::warn!(%issue, format = %self.format, "dump issue");
        self.issues.push(issue);
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index).and_then(Option::as_ref)
    }

    /// Present blocks in index order
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (i, b)))
    }

    /// Number of present blocks
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    pub fn is_truncated(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, DumpIssue::Truncated { .. }))
    }

    /// Card UID from the header, falling back to the first four bytes of block 0
    pub fn uid(&self) -> Option<String> {
        if let Some(uid) = &self.header.uid {
            return Some(uid.clone());
        }
        self.block(0)
            .and_then(|b| b.range(0, 4))
            .map(spaced_hex)
    }
}

/// Assemble a dump in the given format
///
/// Fails with [`DumpError::MalformedDump`] only when no block at all could be
/// recovered.
pub fn assemble(content: &[u8], format: DumpFormat) -> Result<TagDump, DumpError> {
    let dump = match format {
        DumpFormat::Flipper => flipper::assemble(content),
        DumpFormat::Proxmark => proxmark::assemble(content),
    };

    if dump.block_count() == 0 {
        let reason = match dump.issues.first() {
            Some(issue) => format!("no usable blocks ({})", issue),
            None => "no usable blocks".to_string(),
        };
        return Err(DumpError::MalformedDump { format, reason });
    }

    tracing::debug!(
        format = %format,
        blocks = dump.block_count(),
        issues = dump.issues.len(),
        "assembled dump"
    );
    Ok(dump)
}

/// Format bytes as uppercase hex pairs separated by spaces
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
