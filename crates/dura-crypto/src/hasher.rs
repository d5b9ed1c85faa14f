use std::io::{self, Read, Write};

use dura_types::ContentHash;
use sha2::{Digest, Sha256};

/// Default read size when hashing from a reader (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Incremental SHA-256 content hasher.
///
/// Feed bytes with [`update`](Self::update) as they stream past, then call
/// [`finalize`](Self::finalize) to obtain the [`ContentHash`]. The digest is
/// the plain SHA-256 of the bytes, with no domain prefix, so it matches what
/// any other SHA-256 implementation produces for the same content.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
    consumed: u64,
}

impl ContentHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.consumed += chunk.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finish hashing and return the content address.
    pub fn finalize(self) -> ContentHash {
        let digest = self.inner.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        ContentHash::from_digest(bytes)
    }

    /// Hash a complete buffer.
    pub fn digest(data: &[u8]) -> ContentHash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Copy `reader` into `writer`, hashing the bytes on the way through.
    ///
    /// Reads `chunk_size` bytes at a time and retries interrupted reads.
    /// Returns the digest and the number of bytes copied.
    pub fn copy_hashed<R: Read, W: Write>(
        mut reader: R,
        mut writer: W,
        chunk_size: usize,
    ) -> io::Result<(ContentHash, u64)> {
        let mut hasher = Self::new();
        let mut buffer = vec![0u8; chunk_size.max(1)];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
            writer.write_all(&buffer[..n])?;
        }
        writer.flush()?;
        let consumed = hasher.consumed();
        Ok((hasher.finalize(), consumed))
    }

    /// Verify that `data` hashes to `expected`.
    pub fn verify(data: &[u8], expected: &ContentHash) -> bool {
        Self::digest(data) == *expected
    }
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher")
            .field("consumed", &self.consumed)
            .finish()
    }
}
