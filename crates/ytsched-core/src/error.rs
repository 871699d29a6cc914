//! Core error types for ytsched-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure
//! the library can surface is a member of a closed set of tagged kinds, so
//! callers never have to parse message text to decide how to react.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ytsched-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Slot allocation errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Ledger consistency errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Project storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Upload transfer errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// OAuth-related errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Missing startup capability (credentials, token)
    #[error("{0}")]
    Capability(#[from] CapabilityError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Slot-allocation errors.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Cadence must fit whole seconds between slots within one day
    #[error("Invalid cadence: videos_per_day must be between 1 and 86400 (got {0})")]
    InvalidCadence(u32),

    /// Timezone name did not resolve to an IANA zone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Day start time was not a valid HH:MM string
    #[error("Invalid day start time '{0}': expected HH:MM")]
    InvalidDayStart(String),

    /// The allocator ran out of candidate slots before filling the request
    #[error(
        "Unable to find {needed} free schedule slots after trying {tried} candidates; \
         check reserved slots"
    )]
    SlotExhaustion { needed: usize, tried: usize },
}

/// Ledger internal-consistency errors.
///
/// These should be unreachable when the allocator and dedup filtering are
/// used correctly; they exist as a defense against double-publishing.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Two records would share a publish slot
    #[error("Ledger conflict: slot {0} is already assigned to another upload")]
    SlotConflict(String),

    /// Two records would share a content identity
    #[error("Ledger conflict: content {digest} ({size} bytes) was already uploaded")]
    IdentityConflict { digest: String, size: u64 },
}

/// Project-storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Project document does not exist
    #[error("Project not found: {0}")]
    NotFound(String),

    /// Project document already exists
    #[error("Project already exists: {0}")]
    AlreadyExists(String),

    /// Project name normalizes to nothing usable
    #[error("Invalid project name '{0}': must include at least one letter or number")]
    InvalidName(String),

    /// Home directory could not be determined
    #[error("Cannot determine data directory")]
    NoDataDir,

    /// Filesystem failure
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document (de)serialization failure
    #[error("Failed to parse project document: {0}")]
    ParseFailed(#[from] serde_json::Error),

    /// Config (de)serialization failure
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}

/// Transfer errors, classified once at the HTTP client boundary.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Server-side rate limiting or unavailability; safe to retry
    #[error("Transient transfer error (HTTP {status}): {message}")]
    Transient { status: u16, message: String },

    /// The channel's upload/publishing cap was reached; fatal for the
    /// whole batch but everything already recorded stays durable
    #[error("Upload quota exceeded for this channel")]
    QuotaExceeded,

    /// Retry budget exhausted; wraps the last transient error
    #[error("Transfer failed after {attempts} retries: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<TransferError>,
    },

    /// Remote rejected the request for a non-retriable reason
    #[error("Transfer failed (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The resumable session response was missing required data
    #[error("Transfer protocol error: {0}")]
    Protocol(String),

    /// Network failure below the HTTP layer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// OAuth-specific errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// Access token expired with no refresh token on file
    #[error("Access token expired and no refresh token available")]
    TokenExpired,

    /// Client secrets file could not be read or parsed
    #[error("Cannot read client secrets at {path}: {message}")]
    SecretsUnreadable { path: PathBuf, message: String },

    /// Filesystem failure while loading/saving tokens
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing-capability errors surfaced by the startup check.
///
/// The CLI maps these to exit code 2 (dependency unavailable), distinct
/// from generic failures.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// No client secrets path set on the project
    #[error("Project '{0}' has no client secrets configured; run: ytsched project set {0} --client-secrets <path>")]
    SecretsNotConfigured(String),

    /// Client secrets path set but the file is gone
    #[error("Client secrets file not found: {0}")]
    SecretsMissing(PathBuf),

    /// No stored token for the project
    #[error("Not authenticated for project '{0}'; run: ytsched auth {0}")]
    NotAuthenticated(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
