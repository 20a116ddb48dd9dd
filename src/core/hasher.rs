//! Artifact hashing for session identities.
//!
//! A session is keyed by the content hash of the uploaded artifact (the
//! `.torrent` file). BLAKE3 is the primary digest; SHA-256 can be computed
//! alongside for interoperability with tools that expect it.

use crate::core::error::SessionError;
use crate::core::types::SessionId;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Digests of an uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactDigest {
    /// BLAKE3 hex digest (always computed).
    pub blake3: String,

    /// SHA-256 hex digest, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ArtifactDigest {
    /// Returns the session ID derived from this digest.
    pub fn session_id(&self) -> SessionId {
        SessionId::new(self.blake3.clone())
    }
}

/// Computes artifact digests.
///
/// # Examples
///
/// ```rust
/// use torrentguard::core::ArtifactHasher;
///
/// let digest = ArtifactHasher::new().with_sha256(true).hash_bytes(b"torrent");
/// assert!(digest.sha256.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArtifactHasher {
    compute_sha256: bool,
}

impl ArtifactHasher {
    /// Creates a hasher that computes BLAKE3 only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables SHA-256 computation.
    pub fn with_sha256(mut self, enabled: bool) -> Self {
        self.compute_sha256 = enabled;
        self
    }

    /// Hashes an in-memory artifact.
    pub fn hash_bytes(&self, data: &[u8]) -> ArtifactDigest {
        let blake3 = blake3::hash(data).to_hex().to_string();
        let sha256 = self
            .compute_sha256
            .then(|| format!("{:x}", Sha256::digest(data)));

        ArtifactDigest { blake3, sha256 }
    }

    /// Hashes a reader in a single streaming pass.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> Result<ArtifactDigest, SessionError> {
        let mut blake3_hasher = blake3::Hasher::new();
        let mut sha256_hasher = self.compute_sha256.then(Sha256::new);

        let mut buffer = [0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            let chunk = &buffer[..bytes_read];
            blake3_hasher.update(chunk);
            if let Some(ref mut h) = sha256_hasher {
                h.update(chunk);
            }
        }

        Ok(ArtifactDigest {
            blake3: blake3_hasher.finalize().to_hex().to_string(),
            sha256: sha256_hasher.map(|h| format!("{:x}", h.finalize())),
        })
    }

    /// Hashes a file on disk.
    pub fn hash_file(&self, path: &Path) -> Result<ArtifactDigest, SessionError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        self.hash_reader(&mut reader)
    }
}
