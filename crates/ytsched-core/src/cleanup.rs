//! Planner for deleting local copies of already-uploaded videos.
//!
//! A file is eligible only when both its name *and* its content identity
//! match the same ledger record, so a re-exported file that reuses an old
//! name is never deleted.

use std::path::{Path, PathBuf};

use crate::identity::ContentIdentity;
use crate::ledger::UploadLedger;

/// One file safe to delete, with its size for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub path: PathBuf,
    pub size: u64,
}

/// Plan of verified deletions for a directory.
#[derive(Debug, Default)]
pub struct CleanupPlan {
    pub candidates: Vec<CleanupCandidate>,
}

impl CleanupPlan {
    pub fn total_bytes(&self) -> u64 {
        self.candidates.iter().map(|c| c.size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Scans `dir` for files whose name and content identity both match a
/// ledger record. Files are checked in sorted name order; unreadable
/// files are skipped rather than failing the whole plan.
pub fn plan_cleanup(dir: &Path, ledger: &UploadLedger) -> std::io::Result<CleanupPlan> {
    let mut plan = CleanupPlan::default();
    let mut names: Vec<&str> = ledger.records().iter().map(|r| r.file_name.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    for name in names {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        let identity = match ContentIdentity::of_file(&path) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let verified = ledger
            .records()
            .iter()
            .any(|r| r.file_name == name && r.identity == identity);
        if verified {
            let size = identity.size;
            plan.candidates.push(CleanupCandidate { path, size });
        }
    }
    Ok(plan)
}

/// Deletes every file in the plan, returning how many succeeded.
/// Individual failures are logged and do not abort the rest.
pub fn execute_cleanup(plan: &CleanupPlan) -> usize {
    let mut deleted = 0;
    for candidate in &plan.candidates {
        match std::fs::remove_file(&candidate.path) {
            Ok(()) => deleted += 1,
            Err(e) => {
                tracing::warn!(path = %candidate.path.display(), error = %e, "failed to delete");
            }
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::UploadRecord;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    fn record_for(path: &Path) -> UploadRecord {
        UploadRecord::new(
            path.file_name().unwrap().to_string_lossy().into_owned(),
            ContentIdentity::of_file(path).unwrap(),
            "vid".into(),
            None,
        )
    }

    #[test]
    fn plans_only_name_and_identity_matches() {
        let dir = TempDir::new().unwrap();
        let uploaded = write_file(dir.path(), "a.mp4", b"uploaded bytes");
        // Same name as a ledger record but different content: must survive.
        write_file(dir.path(), "b.mp4", b"new export");
        // Never uploaded at all.
        write_file(dir.path(), "c.mp4", b"fresh");

        let mut ledger = UploadLedger::default();
        ledger.append(record_for(&uploaded)).unwrap();

        let old_b = write_file(dir.path(), "b.orig", b"original b bytes");
        let mut rec = record_for(&old_b);
        rec.file_name = "b.mp4".into();
        rec.remote_id = "vid-b".into();
        ledger.append(rec).unwrap();

        let plan = plan_cleanup(dir.path(), &ledger).unwrap();
        assert_eq!(plan.candidates.len(), 1);
        assert_eq!(plan.candidates[0].path, uploaded);
        assert_eq!(plan.total_bytes(), b"uploaded bytes".len() as u64);
    }

    #[test]
    fn empty_ledger_plans_nothing() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.mp4", b"data");
        let plan = plan_cleanup(dir.path(), &UploadLedger::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let gone = write_file(dir.path(), "a.mp4", b"data");
        let mut ledger = UploadLedger::default();
        ledger.append(record_for(&gone)).unwrap();
        std::fs::remove_file(&gone).unwrap();

        let plan = plan_cleanup(dir.path(), &ledger).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn execute_removes_planned_files() {
        let dir = TempDir::new().unwrap();
        let uploaded = write_file(dir.path(), "a.mp4", b"uploaded bytes");
        let kept = write_file(dir.path(), "c.mp4", b"fresh");

        let mut ledger = UploadLedger::default();
        ledger.append(record_for(&uploaded)).unwrap();

        let plan = plan_cleanup(dir.path(), &ledger).unwrap();
        assert_eq!(execute_cleanup(&plan), 1);
        assert!(!uploaded.exists());
        assert!(kept.exists());
    }
}
