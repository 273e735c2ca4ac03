//! Content fingerprinting.
//!
//! A fingerprint is the SHA-256 digest of a file's full byte stream, encoded
//! as 64 hex characters. It identifies *content*, not location: the same
//! bytes under two different paths hash identically, which is what lets the
//! result cache recognize a resubmitted document regardless of its upload
//! path. Files are streamed in fixed-size chunks so large scans never have
//! to fit in memory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 digest of a byte stream, hex encoded. Sole cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a file by streaming its content in 64 KiB chunks.
///
/// # Errors
///
/// Returns `VeridocError::Io` when the file is missing or unreadable
/// (these always bubble up).
pub async fn fingerprint_file(path: impl AsRef<Path>) -> Result<ContentFingerprint> {
    let mut file = File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ContentFingerprint(hex::encode(hasher.finalize())))
}

/// Fingerprint an in-memory byte source.
pub fn fingerprint_bytes(content: &[u8]) -> ContentFingerprint {
    ContentFingerprint(hex::encode(Sha256::digest(content)))
}
