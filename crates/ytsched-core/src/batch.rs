//! Batch composition: scan the upload directory, filter out anything the
//! ledger already knows, pair the remaining files with freshly allocated
//! slots, and run the transfers strictly sequentially.
//!
//! The ledger is appended and persisted after every single item, so an
//! interrupted or quota-stopped batch survives exactly as far as it got
//! and the next run resumes via the dedup check.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, TransferError};
use crate::identity::ContentIdentity;
use crate::ledger::UploadRecord;
use crate::schedule::allocate_slots;
use crate::storage::{Project, ProjectStore};
use crate::youtube::UploadMetadata;

/// One file queued for upload, paired with its allocated publish slot.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub path: PathBuf,
    pub file_name: String,
    pub identity: ContentIdentity,
    pub slot: String,
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every planned item was transferred.
    Completed,
    /// The channel's upload cap was hit; remaining items were skipped but
    /// everything before the stop is durable.
    QuotaReached,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub uploaded: Vec<UploadRecord>,
    pub skipped: usize,
    pub outcome: BatchOutcome,
}

/// Seam the batch runner drives; one call transfers one file end to end
/// and returns the remote-assigned id.
#[allow(async_fn_in_trait)]
pub trait VideoUploader {
    async fn upload(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        publish_at: &str,
    ) -> Result<String, TransferError>;
}

/// Lists candidate video files in `dir`, sorted lexicographically by file
/// name so slot pairing is stable across runs.
pub fn scan_video_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if matches {
            files.push(path);
        }
    }
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Builds the batch plan: dedup-filters `files` against the project
/// ledger, then allocates one slot per remaining file in a single
/// allocator call so slot ordering is stable.
pub fn plan_batch(
    project: &Project,
    files: &[PathBuf],
    start: DateTime<Utc>,
) -> Result<(Vec<BatchItem>, usize), CoreError> {
    let mut pending = Vec::new();
    for path in files {
        let identity = ContentIdentity::of_file(path)?;
        if project.uploaded.is_done(&identity) {
            tracing::debug!(path = %path.display(), "already uploaded; skipping");
            continue;
        }
        pending.push((path.clone(), identity));
    }
    let skipped = files.len() - pending.len();

    let mut reserved: BTreeSet<String> = project.uploaded.reserved_slots();
    let slots = allocate_slots(start, &project.cadence(), pending.len(), &mut reserved)?;

    let items = pending
        .into_iter()
        .zip(slots)
        .map(|((path, identity), slot)| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            BatchItem {
                path,
                file_name,
                identity,
                slot,
            }
        })
        .collect();
    Ok((items, skipped))
}

/// Runs the planned batch strictly sequentially. On success of each item
/// the record is appended and the project persisted before the next item
/// starts. A quota stop returns a distinguished partial outcome; any
/// other transfer failure propagates and stops the batch.
pub async fn run_batch<U: VideoUploader>(
    uploader: &U,
    store: &ProjectStore,
    project: &mut Project,
    plan: Vec<BatchItem>,
    metadata: &UploadMetadata,
    throttle: Duration,
) -> Result<BatchReport, CoreError> {
    let total = plan.len();
    let mut report = BatchReport {
        uploaded: Vec::new(),
        skipped: 0,
        outcome: BatchOutcome::Completed,
    };

    for (index, item) in plan.into_iter().enumerate() {
        tracing::info!(
            file = %item.file_name,
            slot = %item.slot,
            "uploading {}/{}",
            index + 1,
            total
        );

        match uploader.upload(&item.path, metadata, &item.slot).await {
            Ok(remote_id) => {
                let record = UploadRecord::new(
                    item.file_name,
                    item.identity,
                    remote_id,
                    Some(item.slot),
                );
                project.uploaded.append(record.clone())?;
                store.save(project)?;
                report.uploaded.push(record);

                if !throttle.is_zero() && index + 1 < total {
                    tokio::time::sleep(throttle).await;
                }
            }
            Err(TransferError::QuotaExceeded) => {
                tracing::warn!(
                    completed = report.uploaded.len(),
                    remaining = total - index,
                    "upload quota reached; stopping batch"
                );
                report.skipped = total - index;
                report.outcome = BatchOutcome::QuotaReached;
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}
