//! Journal writer: append-only ledger journal with checksums
//!
//! Each committed ledger entry is framed and appended to a journal file:
//!
//! ```text
//! [body_len: u32]
//! [sequence: u64]
//! [payload_len: u32][payload: bincode(TransactionEntry)]
//! [checksum: u32]  // CRC32C over sequence ++ payload
//! ```
//!
//! Files rotate at a size limit; flush and fsync cadence are configurable.

use crc32c::crc32c;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use types::entry::TransactionEntry;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Checksum mismatch at sequence {0}")]
    ChecksumMismatch(u64),

    #[error("Sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },
}

/// Controls when buffered data is flushed to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    EveryWrite,
    EveryN(usize),
}

/// Controls when `fsync` (durable write) is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    EveryWrite,
    EveryN(usize),
    OnRotation,
}

/// Configuration for the journal writer.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory for journal files.
    pub dir: PathBuf,
    /// Maximum file size in bytes before rotation.
    pub max_file_size: u64,
    pub flush_policy: FlushPolicy,
    pub fsync_policy: FsyncPolicy,
}

impl JournalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: 64 * 1024 * 1024, // 64 MiB
            flush_policy: FlushPolicy::EveryWrite,
            fsync_policy: FsyncPolicy::OnRotation,
        }
    }
}

/// Frame a single entry for the wire.
pub(crate) fn encode_frame(sequence: u64, payload: &[u8]) -> Vec<u8> {
    let mut checksummed = Vec::with_capacity(8 + payload.len());
    checksummed.extend_from_slice(&sequence.to_le_bytes());
    checksummed.extend_from_slice(payload);
    let checksum = crc32c(&checksummed);

    // body = seq (8) + payload_len (4) + payload + crc (4)
    let body_len = 8 + 4 + payload.len() as u32 + 4;
    let mut buf = Vec::with_capacity(4 + body_len as usize);
    buf.extend_from_slice(&body_len.to_le_bytes());
    buf.extend_from_slice(&sequence.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

/// Append-only journal writer with checksums, rotation, and fsync control.
pub struct JournalWriter {
    config: JournalConfig,
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_file_size: u64,
    next_sequence: u64,
    writes_since_flush: usize,
    writes_since_fsync: usize,
    file_index: u64,
}

impl JournalWriter {
    /// Open a journal writer, creating the directory if needed and
    /// continuing after the highest existing file index.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;

        let file_index = Self::find_latest_index(&config.dir);
        let current_file = Self::journal_path(&config.dir, file_index);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&current_file)?;
        let current_file_size = file.metadata()?.len();

        Ok(Self {
            config,
            writer: BufWriter::new(file),
            current_file,
            current_file_size,
            next_sequence: 0,
            writes_since_flush: 0,
            writes_since_fsync: 0,
            file_index,
        })
    }

    /// Set the next sequence number (used after recovery).
    pub fn set_next_sequence(&mut self, seq: u64) {
        self.next_sequence = seq;
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn current_file_path(&self) -> &Path {
        &self.current_file
    }

    /// Append one ledger entry, assigning it the next sequence number.
    pub fn append(&mut self, entry: &TransactionEntry) -> Result<u64, JournalError> {
        if self.current_file_size >= self.config.max_file_size {
            self.rotate()?;
        }

        let payload =
            bincode::serialize(entry).map_err(|e| JournalError::Serialization(e.to_string()))?;
        let sequence = self.next_sequence;
        let frame = encode_frame(sequence, &payload);

        self.writer.write_all(&frame)?;
        self.current_file_size += frame.len() as u64;
        self.next_sequence += 1;
        self.writes_since_flush += 1;
        self.writes_since_fsync += 1;

        self.apply_flush_policy()?;
        self.apply_fsync_policy()?;
        Ok(sequence)
    }

    /// Force flush + fsync (used before shutdown / rotation).
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.writes_since_flush = 0;
        self.writes_since_fsync = 0;
        Ok(())
    }

    fn apply_flush_policy(&mut self) -> Result<(), JournalError> {
        let should_flush = match self.config.flush_policy {
            FlushPolicy::EveryWrite => true,
            FlushPolicy::EveryN(n) => self.writes_since_flush >= n,
        };
        if should_flush {
            self.writer.flush()?;
            self.writes_since_flush = 0;
        }
        Ok(())
    }

    fn apply_fsync_policy(&mut self) -> Result<(), JournalError> {
        let should_fsync = match self.config.fsync_policy {
            FsyncPolicy::EveryWrite => true,
            FsyncPolicy::EveryN(n) => self.writes_since_fsync >= n,
            FsyncPolicy::OnRotation => false,
        };
        if should_fsync {
            self.writer.flush()?;
            self.writer.get_ref().sync_all()?;
            self.writes_since_fsync = 0;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.sync()?;

        self.file_index += 1;
        self.current_file = Self::journal_path(&self.config.dir, self.file_index);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.current_file)?;
        self.writer = BufWriter::new(file);
        self.current_file_size = 0;
        Ok(())
    }

    pub(crate) fn journal_path(dir: &Path, index: u64) -> PathBuf {
        dir.join(format!("ledger-{:06}.bin", index))
    }

    pub(crate) fn find_latest_index(dir: &Path) -> u64 {
        fs::read_dir(dir)
            .ok()
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| {
                        let name = e.file_name().to_string_lossy().to_string();
                        name.strip_prefix("ledger-")?
                            .strip_suffix(".bin")?
                            .parse::<u64>()
                            .ok()
                    })
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}
