//! Journal reader: verify and replay a journal directory
//!
//! Scans journal files in index order, decodes frames, verifies the CRC32C
//! checksum and sequence continuity of every record, and can replay the
//! entry stream into per-user balance totals for audit.

use crate::journal::{JournalError, JournalWriter};
use crc32c::crc32c;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use types::entry::TransactionEntry;
use types::ids::UserId;
use types::numeric::Cents;

/// One decoded, checksum-verified journal record.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRecord {
    pub sequence: u64,
    pub entry: TransactionEntry,
}

/// Reader over a journal directory.
pub struct JournalReader {
    dir: PathBuf,
}

impl JournalReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read every record in sequence order, verifying checksums and
    /// sequence continuity.
    pub fn read_all(&self) -> Result<Vec<JournalRecord>, JournalError> {
        let mut records = Vec::new();
        for path in self.journal_files()? {
            let data = fs::read(&path)?;
            let mut pos = 0;
            while pos < data.len() {
                let (record, consumed) = decode_frame(&data[pos..])?;
                records.push(record);
                pos += consumed;
            }
        }

        for (i, record) in records.iter().enumerate() {
            let expected = records[0].sequence + i as u64;
            if record.sequence != expected {
                return Err(JournalError::SequenceError {
                    expected,
                    got: record.sequence,
                });
            }
        }
        Ok(records)
    }

    /// Replay records into final balance per user: the running sum of entry
    /// amounts, which must match each entry's `balance_after`.
    pub fn replay_balances(
        records: &[JournalRecord],
    ) -> Result<HashMap<UserId, Cents>, JournalError> {
        let mut balances: HashMap<UserId, Cents> = HashMap::new();
        for record in records {
            let entry = &record.entry;
            let balance = balances.entry(entry.user_id).or_insert(Cents::ZERO);
            *balance += entry.amount;
            if *balance != entry.balance_after {
                return Err(JournalError::Serialization(format!(
                    "replayed balance {} diverges from recorded {} at sequence {}",
                    balance, entry.balance_after, record.sequence
                )));
            }
        }
        Ok(balances)
    }

    fn journal_files(&self) -> Result<Vec<PathBuf>, JournalError> {
        let latest = JournalWriter::find_latest_index(&self.dir);
        let mut files = Vec::new();
        for index in 0..=latest {
            let path = JournalWriter::journal_path(&self.dir, index);
            if path.exists() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn decode_frame(data: &[u8]) -> Result<(JournalRecord, usize), JournalError> {
    if data.len() < 4 {
        return Err(JournalError::Serialization(
            "not enough data for length prefix".into(),
        ));
    }
    let body_len = u32::from_le_bytes(data[0..4].try_into().expect("sized slice")) as usize;
    let total = 4 + body_len;
    if data.len() < total || body_len < 16 {
        return Err(JournalError::Serialization(format!(
            "truncated frame: need {} bytes, have {}",
            total,
            data.len()
        )));
    }

    let body = &data[4..total];
    let sequence = u64::from_le_bytes(body[0..8].try_into().expect("sized slice"));
    let payload_len = u32::from_le_bytes(body[8..12].try_into().expect("sized slice")) as usize;
    if 12 + payload_len + 4 != body.len() {
        return Err(JournalError::Serialization(format!(
            "payload length {} inconsistent with frame body {}",
            payload_len,
            body.len()
        )));
    }
    let payload = &body[12..12 + payload_len];
    let stored_checksum =
        u32::from_le_bytes(body[12 + payload_len..].try_into().expect("sized slice"));

    let mut checksummed = Vec::with_capacity(8 + payload.len());
    checksummed.extend_from_slice(&sequence.to_le_bytes());
    checksummed.extend_from_slice(payload);
    if crc32c(&checksummed) != stored_checksum {
        return Err(JournalError::ChecksumMismatch(sequence));
    }

    let entry: TransactionEntry =
        bincode::deserialize(payload).map_err(|e| JournalError::Serialization(e.to_string()))?;
    Ok((JournalRecord { sequence, entry }, total))
}

/// Verify a single file on disk without loading the whole directory.
pub fn verify_file(path: &Path) -> Result<usize, JournalError> {
    let data = fs::read(path)?;
    let mut pos = 0;
    let mut count = 0;
    while pos < data.len() {
        let (_, consumed) = decode_frame(&data[pos..])?;
        pos += consumed;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalConfig;
    use tempfile::TempDir;
    use types::prelude::EntryKind;

    fn entry_for(user: UserId, amount: i64, balance_after: i64) -> TransactionEntry {
        TransactionEntry::new(
            user,
            if amount >= 0 {
                EntryKind::Deposit
            } else {
                EntryKind::Withdrawal
            },
            Cents::new(amount),
            Cents::new(balance_after),
            None,
            None,
            None,
            "audit",
            0,
        )
    }

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let user = UserId::new();
        {
            let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();
            writer.append(&entry_for(user, 1_000, 1_000)).unwrap();
            writer.append(&entry_for(user, -400, 600)).unwrap();
            writer.sync().unwrap();
        }

        let records = JournalReader::new(tmp.path()).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[1].entry.amount, Cents::new(-400));
    }

    #[test]
    fn test_replay_balances() {
        let tmp = TempDir::new().unwrap();
        let user = UserId::new();
        {
            let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();
            writer.append(&entry_for(user, 1_000, 1_000)).unwrap();
            writer.append(&entry_for(user, -250, 750)).unwrap();
            writer.sync().unwrap();
        }

        let records = JournalReader::new(tmp.path()).read_all().unwrap();
        let balances = JournalReader::replay_balances(&records).unwrap();
        assert_eq!(balances[&user], Cents::new(750));
    }

    #[test]
    fn test_replay_detects_divergence() {
        let records = vec![JournalRecord {
            sequence: 0,
            entry: entry_for(UserId::new(), 100, 999), // wrong balance_after
        }];
        assert!(JournalReader::replay_balances(&records).is_err());
    }

    #[test]
    fn test_corruption_detected() {
        let tmp = TempDir::new().unwrap();
        let user = UserId::new();
        let path;
        {
            let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();
            writer.append(&entry_for(user, 1_000, 1_000)).unwrap();
            writer.sync().unwrap();
            path = writer.current_file_path().to_path_buf();
        }

        // Flip a payload byte.
        let mut data = fs::read(&path).unwrap();
        let mid = data.len() / 2;
        data[mid] ^= 0xFF;
        fs::write(&path, data).unwrap();

        let err = JournalReader::new(tmp.path()).read_all().unwrap_err();
        match err {
            JournalError::ChecksumMismatch(_) | JournalError::Serialization(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_read_across_rotated_files() {
        let tmp = TempDir::new().unwrap();
        let user = UserId::new();
        {
            let config = JournalConfig {
                max_file_size: 64,
                ..JournalConfig::new(tmp.path())
            };
            let mut writer = JournalWriter::open(config).unwrap();
            let mut balance = 0;
            for _ in 0..10 {
                balance += 100;
                writer.append(&entry_for(user, 100, balance)).unwrap();
            }
            writer.sync().unwrap();
        }

        let records = JournalReader::new(tmp.path()).read_all().unwrap();
        assert_eq!(records.len(), 10);
        let balances = JournalReader::replay_balances(&records).unwrap();
        assert_eq!(balances[&user], Cents::new(1_000));
    }
}
