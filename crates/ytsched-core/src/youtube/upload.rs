//! Transfer orchestration: drives a [`ChunkTransport`] to completion with
//! bounded exponential-backoff retry.
//!
//! Only the transient class (rate limiting, server unavailability) is
//! retried; quota and rejection errors propagate on first occurrence with
//! zero delay. The orchestrator never touches the ledger; recording a
//! completed transfer is the batch runner's job.

use std::path::Path;
use std::time::Duration;

use rand::Rng;

use crate::batch::VideoUploader;
use crate::error::TransferError;
use crate::youtube::client::{
    ChunkProgress, ChunkTransport, ResumableUpload, UploadMetadata, YouTubeClient,
};

/// Retry behavior for transient transfer failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed per unfinished chunk before giving up.
    pub max_retries: u32,
    /// First backoff delay; doubles on each consecutive failure.
    pub base_delay: Duration,
    /// Backoff ceiling (before jitter).
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the backoff for the given attempt (1-based):
    /// `min(base * 2^(attempt-1), max)`.
    pub fn backoff_base(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.base_delay.saturating_mul(factor), self.max_delay)
    }

    /// Full backoff: base plus a random jitter in `[0, 1s)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..1_000);
        self.backoff_base(attempt) + Duration::from_millis(jitter_ms)
    }
}

/// Drives `transport` until the remote reports completion, retrying
/// transient chunk failures per `policy`. Returns the remote-assigned
/// video id.
pub async fn run_transfer<T: ChunkTransport>(
    transport: &mut T,
    policy: &RetryPolicy,
) -> Result<String, TransferError> {
    let mut attempt = 0u32;
    let mut last_committed: Option<u64> = None;
    loop {
        let (status, message) = match transport.upload_chunk().await {
            Ok(ChunkProgress::Complete { video_id }) => return Ok(video_id),
            Ok(ChunkProgress::Incomplete { committed })
                if last_committed.map_or(true, |prev| committed > prev) =>
            {
                tracing::debug!(committed, "chunk accepted");
                last_committed = Some(committed);
                // Progress resets the retry budget for the next chunk.
                attempt = 0;
                continue;
            }
            // The remote kept the session open but committed nothing
            // new; retrying immediately would spin.
            Ok(ChunkProgress::Incomplete { committed }) => (
                308,
                format!("remote committed no new bytes past offset {committed}"),
            ),
            Err(TransferError::Transient { status, message }) => (status, message),
            Err(other) => return Err(other),
        };

        attempt += 1;
        if attempt > policy.max_retries {
            return Err(TransferError::RetriesExhausted {
                attempts: policy.max_retries,
                source: Box::new(TransferError::Transient { status, message }),
            });
        }
        let delay = policy.backoff_delay(attempt);
        tracing::warn!(
            status,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "transient upload error; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Production uploader: starts a resumable session per file and drives it
/// through [`run_transfer`].
pub struct YouTubeUploader<'a> {
    pub client: &'a YouTubeClient,
    pub policy: RetryPolicy,
    /// Chunk size in bytes; 0 means the protocol default.
    pub chunk_size: usize,
}

impl VideoUploader for YouTubeUploader<'_> {
    async fn upload(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        publish_at: &str,
    ) -> Result<String, TransferError> {
        let file_size = std::fs::metadata(path)?.len();
        let session_uri = self
            .client
            .start_resumable_session(metadata, Some(publish_at), file_size)
            .await?;
        let mut transport =
            ResumableUpload::new(self.client, session_uri, path, self.chunk_size)?;
        run_transfer(&mut transport, &self.policy).await
    }
}
