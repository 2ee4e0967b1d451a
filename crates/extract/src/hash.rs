//! Content fingerprinting.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Files are hashed in chunks of this size, never loaded whole.
pub const BUFFER_SIZE: usize = 8 * 1024;
/// Length of a hex-rendered SHA-256 digest.
pub const HASH_LENGTH: usize = 64;

/// SHA-256 digest of a file's bytes, rendered as lowercase hex.
///
/// Identical bytes always produce the identical hash, which makes it usable as
/// both the deduplication key and as a stable stem for derived artifacts (such
/// as extracted cover images).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash an in-memory buffer.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(Sha256::digest(bytes.as_ref())))
    }

    /// Hash everything a reader yields, [`BUFFER_SIZE`] bytes at a time.
    ///
    /// Fails if the reader fails before reaching EOF; a partially computed
    /// digest is never returned.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
            };
            hasher.update(&buffer[..read]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Open and hash a file on disk.
    #[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::from_reader(file)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == HASH_LENGTH && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            exn::bail!(ErrorKind::InvalidHash(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
