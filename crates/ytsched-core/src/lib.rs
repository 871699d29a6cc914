//! # ytsched Core Library
//!
//! This library provides the core business logic for ytsched, a CLI tool
//! that uploads batches of video files to YouTube and schedules each one
//! for a future publish time. All operations are available through the
//! standalone `ytsched` binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Slot allocation**: pure cadence math turning (start instant,
//!   timezone, videos-per-day, day start) into distinct future UTC
//!   publish timestamps, skipping anything already reserved
//! - **Upload ledger**: append-only record of completed transfers keyed
//!   by content identity (SHA-256 + size), so re-runs are idempotent
//! - **Transfer**: chunked resumable uploads with bounded
//!   exponential-backoff retry and structured failure classification
//! - **Storage**: per-project JSON documents with atomic persistence
//!
//! ## Key Components
//!
//! - [`schedule::allocate_slots`]: the slot allocator
//! - [`UploadLedger`]: completed-transfer bookkeeping
//! - [`youtube::YouTubeClient`]: resumable upload protocol client
//! - [`batch::run_batch`]: sequential batch composition root

pub mod batch;
pub mod cleanup;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod schedule;
pub mod storage;
pub mod youtube;

pub use error::{
    CapabilityError, CoreError, LedgerError, OAuthError, ScheduleError, StorageError,
    TransferError,
};
pub use identity::ContentIdentity;
pub use ledger::{UploadLedger, UploadRecord};
pub use schedule::Cadence;
pub use storage::{Project, ProjectStore};
