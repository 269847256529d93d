//! Persistence Service
//!
//! Durable append-only journal for ledger transaction entries, with
//! CRC32C-checksummed binary frames, size-based file rotation, and
//! configurable flush/fsync policies. The reader verifies and replays a
//! journal directory for audit.

pub mod journal;
pub mod reader;

pub use journal::{FlushPolicy, FsyncPolicy, JournalConfig, JournalError, JournalWriter};
pub use reader::{JournalReader, JournalRecord};
