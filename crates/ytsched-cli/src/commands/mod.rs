//! CLI subcommand implementations.

pub mod auth;
pub mod cleanup;
pub mod project;
pub mod upload;
pub mod where_cmd;

/// A required dependency (credentials, token) is unavailable.
pub const EXIT_MISSING_CAPABILITY: u8 = 2;
/// The channel's upload quota was reached mid-batch.
pub const EXIT_QUOTA: u8 = 3;

/// Commands return both their exit code and any error.
pub type CmdResult = Result<std::process::ExitCode, Box<dyn std::error::Error>>;

/// Build the runtime that drives the async core operations.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}
