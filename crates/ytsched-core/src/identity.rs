//! Content identity: (size, SHA-256) pairs identifying a file's bytes
//! independent of its name. Two files are "the same upload" iff both
//! fields match.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identity of a file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentIdentity {
    /// Hex-encoded SHA-256 of the full file contents (64 lowercase chars).
    pub digest: String,
    /// File size in bytes.
    pub size: u64,
}

impl ContentIdentity {
    /// Computes the identity of the file at `path` by streaming it
    /// through SHA-256 in 1 MiB chunks.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 1 << 20];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self {
            digest: hex::encode(hasher.finalize()),
            size,
        })
    }
}
