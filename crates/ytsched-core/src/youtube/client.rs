//! YouTube Data API client: channel lookup and the resumable upload
//! protocol.
//!
//! Failure classification happens once, at this boundary: every
//! non-success response is mapped into the closed [`TransferError`] set
//! (transient / quota / rejected), so retry and batch logic never inspect
//! message text.

use std::path::Path;

use reqwest::Client;
use serde_json::json;

use crate::error::TransferError;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Default upload chunk size. The resumable protocol requires chunks in
/// multiples of 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// A channel as returned by `channels.list(mine=true)`.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
}

/// Metadata applied to an uploaded video.
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
    pub made_for_kids: bool,
}

/// Progress of one chunk of a resumable transfer.
#[derive(Debug, Clone)]
pub enum ChunkProgress {
    /// Remote committed bytes up to (not including) `committed`.
    Incomplete { committed: u64 },
    /// Transfer finished; the remote assigned an identifier.
    Complete { video_id: String },
}

/// Capability-bounded seam the transfer orchestrator drives: one call
/// attempts completion of the next unfinished chunk. Implementations must
/// re-send the same unfinished data when called again after an error.
#[allow(async_fn_in_trait)]
pub trait ChunkTransport {
    async fn upload_chunk(&mut self) -> Result<ChunkProgress, TransferError>;
}

/// Thin reqwest wrapper around the YouTube Data API.
pub struct YouTubeClient {
    http: Client,
    access_token: String,
    api_base: String,
    upload_base: String,
}

impl YouTubeClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: Client::new(),
            access_token,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// The authenticated account's channel.
    pub async fn channel_info(&self) -> Result<ChannelInfo, TransferError> {
        let url = format!("{}/channels?part=snippet&mine=true", self.api_base);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resp = check(resp).await?;
        let body: serde_json::Value = resp.json().await?;

        let item = body["items"].get(0).ok_or_else(|| {
            TransferError::Protocol("no YouTube channel found for this account".into())
        })?;
        Ok(ChannelInfo {
            id: item["id"].as_str().unwrap_or_default().to_string(),
            title: item["snippet"]["title"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Initiates a resumable upload session and returns the session URI.
    pub async fn start_resumable_session(
        &self,
        metadata: &UploadMetadata,
        publish_at: Option<&str>,
        file_size: u64,
    ) -> Result<String, TransferError> {
        let url = format!(
            "{}/videos?uploadType=resumable&part=snippet,status",
            self.upload_base
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Length", file_size.to_string())
            .header("X-Upload-Content-Type", "video/*")
            .json(&upload_request_body(metadata, publish_at))
            .send()
            .await?;
        let resp = check(resp).await?;

        resp.headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                TransferError::Protocol("resumable session response missing Location header".into())
            })
    }

    /// Sends one chunk to the session URI. HTTP 308 means the remote is
    /// waiting for more data; its Range header tells us how far it got.
    pub(crate) async fn put_chunk(
        &self,
        session_uri: &str,
        data: Vec<u8>,
        offset: u64,
        total: u64,
    ) -> Result<ChunkProgress, TransferError> {
        if data.is_empty() {
            return Err(TransferError::Protocol("attempted to send an empty chunk".into()));
        }
        let end = offset + data.len() as u64 - 1;
        let resp = self
            .http
            .put(session_uri)
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_RANGE,
                format!("bytes {offset}-{end}/{total}"),
            )
            .body(data)
            .send()
            .await?;

        if resp.status().as_u16() == 308 {
            let committed = resp
                .headers()
                .get(reqwest::header::RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_range_committed)
                // No Range header: nothing new committed, re-send from
                // the current offset.
                .unwrap_or(offset);
            return Ok(ChunkProgress::Incomplete { committed });
        }

        let resp = check(resp).await?;
        let body: serde_json::Value = resp.json().await?;
        let video_id = body["id"].as_str().ok_or_else(|| {
            TransferError::Protocol("upload completion response missing video id".into())
        })?;
        Ok(ChunkProgress::Complete {
            video_id: video_id.to_string(),
        })
    }
}

/// Builds the `videos.insert` request body. Scheduled uploads are always
/// `private` with `publishAt` set; YouTube flips them public at the slot.
pub fn upload_request_body(
    metadata: &UploadMetadata,
    publish_at: Option<&str>,
) -> serde_json::Value {
    let mut snippet = json!({
        "title": metadata.title,
        "description": metadata.description,
    });
    if let Some(tags) = &metadata.tags {
        snippet["tags"] = json!(tags);
    }
    if let Some(category_id) = &metadata.category_id {
        snippet["categoryId"] = json!(category_id);
    }
    let mut status = json!({
        "privacyStatus": "private",
        "selfDeclaredMadeForKids": metadata.made_for_kids,
    });
    if let Some(publish_at) = publish_at {
        status["publishAt"] = json!(publish_at);
    }
    json!({ "snippet": snippet, "status": status })
}

/// Whether a status code belongs to the retriable class: rate limiting
/// (429) or server-side unavailability (5xx).
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

const QUOTA_REASONS: &[&str] = &["uploadLimitExceeded", "quotaExceeded", "dailyLimitExceeded"];

/// Maps a non-success status and Google error body into the closed
/// failure set. Quota reasons win over the status class because YouTube
/// reports the upload cap under more than one status code.
pub fn classify_error(status: u16, body: &serde_json::Value) -> TransferError {
    let reasons = body["error"]["errors"]
        .as_array()
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e["reason"].as_str())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if reasons.iter().any(|r| QUOTA_REASONS.contains(r)) {
        return TransferError::QuotaExceeded;
    }

    let message = body["error"]["message"]
        .as_str()
        .unwrap_or("(no error message)")
        .to_string();
    if is_transient_status(status) {
        TransferError::Transient { status, message }
    } else {
        TransferError::Rejected { status, message }
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, TransferError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    Err(classify_error(status, &body))
}

/// Parses a resumable-protocol Range header ("bytes=0-12345") into the
/// count of committed bytes.
fn parse_range_committed(value: &str) -> Option<u64> {
    let end: u64 = value.strip_prefix("bytes=")?.rsplit('-').next()?.parse().ok()?;
    Some(end + 1)
}

/// Chunked file transport for one resumable session. Tracks the committed
/// offset so a retried call re-reads and re-sends the same unfinished
/// bytes.
pub struct ResumableUpload<'a> {
    client: &'a YouTubeClient,
    session_uri: String,
    file: std::fs::File,
    file_size: u64,
    offset: u64,
    chunk_size: usize,
}

impl<'a> ResumableUpload<'a> {
    /// Opens `path` for chunked upload to `session_uri`.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(
        client: &'a YouTubeClient,
        session_uri: String,
        path: &Path,
        chunk_size: usize,
    ) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            client,
            session_uri,
            file,
            file_size,
            offset: 0,
            chunk_size,
        })
    }

    /// Current committed byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl ChunkTransport for ResumableUpload<'_> {
    async fn upload_chunk(&mut self) -> Result<ChunkProgress, TransferError> {
        use std::io::{Read, Seek, SeekFrom};

        if self.file_size == 0 {
            return Err(TransferError::Protocol("cannot upload an empty file".into()));
        }

        // Seek on every call: a retried chunk re-reads the same bytes.
        self.file.seek(SeekFrom::Start(self.offset))?;
        let len = std::cmp::min(self.chunk_size as u64, self.file_size - self.offset) as usize;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;

        let progress = self
            .client
            .put_chunk(&self.session_uri, buf, self.offset, self.file_size)
            .await?;
        if let ChunkProgress::Incomplete { committed } = &progress {
            self.offset = *committed;
        }
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base: &str) -> YouTubeClient {
        YouTubeClient {
            http: Client::new(),
            access_token: "test-token".into(),
            api_base: base.to_string(),
            upload_base: base.to_string(),
        }
    }

    #[test]
    fn transient_status_class() {
        for status in [429, 500, 502, 503, 599] {
            assert!(is_transient_status(status), "{status}");
        }
        for status in [200, 308, 400, 401, 403, 404, 409] {
            assert!(!is_transient_status(status), "{status}");
        }
    }

    #[test]
    fn classify_quota_reason_wins_over_status() {
        let body = serde_json::json!({
            "error": {
                "code": 400,
                "message": "The user has exceeded the number of videos they may upload.",
                "errors": [{"reason": "uploadLimitExceeded", "domain": "youtube.video"}]
            }
        });
        assert!(matches!(
            classify_error(400, &body),
            TransferError::QuotaExceeded
        ));
        // Same reason under 403.
        assert!(matches!(
            classify_error(403, &body),
            TransferError::QuotaExceeded
        ));
    }

    #[test]
    fn classify_transient_and_rejected() {
        let body = serde_json::json!({
            "error": {"message": "Backend Error", "errors": [{"reason": "backendError"}]}
        });
        assert!(matches!(
            classify_error(503, &body),
            TransferError::Transient { status: 503, .. }
        ));
        assert!(matches!(
            classify_error(429, &body),
            TransferError::Transient { status: 429, .. }
        ));
        assert!(matches!(
            classify_error(401, &body),
            TransferError::Rejected { status: 401, .. }
        ));
        // Empty body still classifies by status.
        assert!(matches!(
            classify_error(500, &serde_json::Value::Null),
            TransferError::Transient { status: 500, .. }
        ));
    }

    #[test]
    fn range_header_parsing() {
        assert_eq!(parse_range_committed("bytes=0-262143"), Some(262_144));
        assert_eq!(parse_range_committed("bytes=0-0"), Some(1));
        assert_eq!(parse_range_committed("garbage"), None);
        assert_eq!(parse_range_committed(""), None);
    }

    #[test]
    fn request_body_shape() {
        let metadata = UploadMetadata {
            title: "My Video".into(),
            description: "desc".into(),
            tags: Some(vec!["a".into(), "b".into()]),
            category_id: Some("22".into()),
            made_for_kids: false,
        };
        let body = upload_request_body(&metadata, Some("2026-03-01T14:00:00Z"));
        assert_eq!(body["snippet"]["title"], "My Video");
        assert_eq!(body["snippet"]["tags"][1], "b");
        assert_eq!(body["snippet"]["categoryId"], "22");
        assert_eq!(body["status"]["privacyStatus"], "private");
        assert_eq!(body["status"]["selfDeclaredMadeForKids"], false);
        assert_eq!(body["status"]["publishAt"], "2026-03-01T14:00:00Z");

        // Optional fields stay absent when unset.
        let bare = upload_request_body(
            &UploadMetadata {
                title: "t".into(),
                ..Default::default()
            },
            None,
        );
        assert!(bare["snippet"].get("tags").is_none());
        assert!(bare["snippet"].get("categoryId").is_none());
        assert!(bare["status"].get("publishAt").is_none());
    }

    #[tokio::test]
    async fn channel_info_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/channels")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [{"id": "UC123", "snippet": {"title": "My Channel"}}]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let info = client.channel_info().await.unwrap();
        assert_eq!(info.id, "UC123");
        assert_eq!(info.title, "My Channel");
    }

    #[tokio::test]
    async fn channel_info_without_channel_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/channels")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.channel_info().await.unwrap_err();
        assert!(matches!(err, TransferError::Protocol(_)));
    }

    #[tokio::test]
    async fn start_session_returns_location() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/videos")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("location", "https://upload.example/session-1")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let metadata = UploadMetadata {
            title: "t".into(),
            ..Default::default()
        };
        let uri = client
            .start_resumable_session(&metadata, Some("2026-03-01T14:00:00Z"), 1024)
            .await
            .unwrap();
        assert_eq!(uri, "https://upload.example/session-1");
    }

    #[tokio::test]
    async fn put_chunk_handles_resume_incomplete() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("PUT", "/session-1")
            .with_status(308)
            .with_header("range", "bytes=0-3")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let progress = client
            .put_chunk(&format!("{}/session-1", server.url()), vec![0u8; 8], 0, 16)
            .await
            .unwrap();
        assert!(matches!(progress, ChunkProgress::Incomplete { committed: 4 }));
    }

    #[tokio::test]
    async fn put_chunk_completes_with_video_id() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("PUT", "/session-1")
            .with_status(200)
            .with_body(r#"{"id": "vidABC"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let progress = client
            .put_chunk(&format!("{}/session-1", server.url()), vec![0u8; 8], 8, 16)
            .await
            .unwrap();
        match progress {
            ChunkProgress::Complete { video_id } => assert_eq!(video_id, "vidABC"),
            other => panic!("expected completion, got {other:?}"),
        }
    }
}
