//! The upload ledger: an append-only record of completed transfers keyed
//! by content identity. A file is "already uploaded" when any record
//! matches its (digest, size) pair, regardless of filename, so renamed
//! but byte-identical files are skipped on re-runs.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::identity::ContentIdentity;
use crate::schedule::to_rfc3339_utc;

/// One completed transfer. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Local file name at upload time (informational; dedup ignores it).
    pub file_name: String,
    /// Content identity of the uploaded bytes.
    pub identity: ContentIdentity,
    /// Identifier assigned by the remote side (YouTube video id).
    pub remote_id: String,
    /// Scheduled publish instant (RFC3339 UTC), if scheduled.
    pub slot: Option<String>,
    /// When this record was created (RFC3339 UTC).
    pub created_at: String,
}

impl UploadRecord {
    pub fn new(
        file_name: String,
        identity: ContentIdentity,
        remote_id: String,
        slot: Option<String>,
    ) -> Self {
        Self {
            file_name,
            identity,
            remote_id,
            slot,
            created_at: to_rfc3339_utc(Utc::now()),
        }
    }
}

/// Completed-transfer bookkeeping for one project.
///
/// Enforced invariants: no two records share a slot, and no two records
/// share a content identity. Durability is the project store's job; the
/// ledger is persisted as part of the project document after every
/// append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadLedger {
    records: Vec<UploadRecord>,
}

impl UploadLedger {
    /// Whether content with this identity was already transferred.
    pub fn is_done(&self, identity: &ContentIdentity) -> bool {
        self.records.iter().any(|r| r.identity == *identity)
    }

    /// Every slot value currently held by a record. This is the set the
    /// allocator must be seeded with before allocating new slots.
    pub fn reserved_slots(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|r| r.slot.clone())
            .collect()
    }

    /// Appends a record, rejecting slot or identity collisions.
    ///
    /// A rejection here is an internal-consistency defect: it cannot
    /// trigger when slots come from the allocator and candidates were
    /// dedup-filtered first.
    pub fn append(&mut self, record: UploadRecord) -> Result<(), LedgerError> {
        if self.is_done(&record.identity) {
            return Err(LedgerError::IdentityConflict {
                digest: record.identity.digest.clone(),
                size: record.identity.size,
            });
        }
        if let Some(slot) = &record.slot {
            if self.records.iter().any(|r| r.slot.as_ref() == Some(slot)) {
                return Err(LedgerError::SlotConflict(slot.clone()));
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(digest: &str, size: u64) -> ContentIdentity {
        ContentIdentity {
            digest: digest.to_string(),
            size,
        }
    }

    fn record(name: &str, digest: &str, size: u64, slot: Option<&str>) -> UploadRecord {
        UploadRecord::new(
            name.to_string(),
            identity(digest, size),
            format!("vid-{digest}"),
            slot.map(String::from),
        )
    }

    #[test]
    fn dedup_matches_identity_not_name() {
        let mut ledger = UploadLedger::default();
        ledger
            .append(record("a.mp4", "d1", 100, Some("2026-01-01T09:00:00Z")))
            .unwrap();

        // Same digest+size under another name is still done.
        assert!(ledger.is_done(&identity("d1", 100)));
        // Same digest, different size is a different upload.
        assert!(!ledger.is_done(&identity("d1", 101)));
        assert!(!ledger.is_done(&identity("d2", 100)));
    }

    #[test]
    fn append_rejects_identity_collision() {
        let mut ledger = UploadLedger::default();
        ledger
            .append(record("a.mp4", "d1", 100, Some("2026-01-01T09:00:00Z")))
            .unwrap();

        let err = ledger
            .append(record("b.mp4", "d1", 100, Some("2026-01-01T21:00:00Z")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::IdentityConflict { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn append_rejects_slot_collision() {
        let mut ledger = UploadLedger::default();
        ledger
            .append(record("a.mp4", "d1", 100, Some("2026-01-01T09:00:00Z")))
            .unwrap();

        let err = ledger
            .append(record("b.mp4", "d2", 200, Some("2026-01-01T09:00:00Z")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::SlotConflict(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unscheduled_records_do_not_collide() {
        let mut ledger = UploadLedger::default();
        ledger.append(record("a.mp4", "d1", 100, None)).unwrap();
        ledger.append(record("b.mp4", "d2", 200, None)).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.reserved_slots().is_empty());
    }

    #[test]
    fn reserved_slots_collects_all_slots() {
        let mut ledger = UploadLedger::default();
        ledger
            .append(record("a.mp4", "d1", 100, Some("2026-01-01T09:00:00Z")))
            .unwrap();
        ledger
            .append(record("b.mp4", "d2", 200, Some("2026-01-01T21:00:00Z")))
            .unwrap();
        ledger.append(record("c.mp4", "d3", 300, None)).unwrap();

        let reserved = ledger.reserved_slots();
        assert_eq!(reserved.len(), 2);
        assert!(reserved.contains("2026-01-01T09:00:00Z"));
        assert!(reserved.contains("2026-01-01T21:00:00Z"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut ledger = UploadLedger::default();
        ledger
            .append(record("a.mp4", "d1", 100, Some("2026-01-01T09:00:00Z")))
            .unwrap();

        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["file_name"], "a.mp4");
        assert_eq!(json[0]["identity"]["digest"], "d1");
        assert_eq!(json[0]["identity"]["size"], 100);
        assert_eq!(json[0]["slot"], "2026-01-01T09:00:00Z");
    }
}
