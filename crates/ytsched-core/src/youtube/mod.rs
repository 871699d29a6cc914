//! YouTube integration: OAuth, the Data API client, and the transfer
//! orchestrator.

pub mod auth;
pub mod client;
pub mod upload;

pub use client::{
    ChannelInfo, ChunkProgress, ChunkTransport, ResumableUpload, UploadMetadata, YouTubeClient,
    DEFAULT_CHUNK_SIZE,
};
pub use upload::{run_transfer, RetryPolicy, YouTubeUploader};

use crate::error::CapabilityError;
use crate::storage::{Project, ProjectStore};

pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Startup capability check: verifies the project has client secrets and
/// a stored token before any network call is attempted. A failure here is
/// "dependency unavailable" (CLI exit code 2), not a transfer error.
pub fn capability_check(store: &ProjectStore, project: &Project) -> Result<(), CapabilityError> {
    let secrets_path = project
        .client_secrets_path
        .as_deref()
        .ok_or_else(|| CapabilityError::SecretsNotConfigured(project.name.clone()))?;
    let secrets_path = std::path::Path::new(secrets_path);
    if !secrets_path.is_file() {
        return Err(CapabilityError::SecretsMissing(secrets_path.to_path_buf()));
    }

    let token_path = store
        .token_path(&project.name)
        .map_err(|_| CapabilityError::NotAuthenticated(project.name.clone()))?;
    if !token_path.is_file() {
        return Err(CapabilityError::NotAuthenticated(project.name.clone()));
    }
    Ok(())
}
