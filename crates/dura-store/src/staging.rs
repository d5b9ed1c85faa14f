//! Content-addressed blob staging.
//!
//! A blob's address is the SHA-256 of its bytes, which is only known after
//! the whole input has been read. Staging therefore streams the input into a
//! uniquely named scratch file while hashing it, and only then renames the
//! scratch file to its content-addressed path:
//!
//! ```text
//! <root>/tmp/<random>                    in-flight, never addressed by hash
//! <root>/sha256/<2-hex prefix>/<hash>    finalized blob
//! ```
//!
//! The rename target is determined by the content, so concurrent stagings of
//! identical bytes converge on the same file. A failed stage never leaves a
//! file under a hash name.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use dura_crypto::ContentHasher;
use dura_types::ContentHash;
use tracing::debug;

use crate::config::StagingConfig;
use crate::error::{StagingError, StagingResult};

const BLOB_DIR: &str = "sha256";
const TMP_DIR: &str = "tmp";

/// Result of staging one blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedBlob {
    /// Content address of the staged bytes.
    pub hash: ContentHash,
    /// Number of bytes staged.
    pub size: u64,
}

/// Buffered reader over a staged blob.
///
/// The underlying file handle is released when the reader is dropped.
#[derive(Debug)]
pub struct BlobReader {
    hash: ContentHash,
    inner: BufReader<File>,
}

impl BlobReader {
    /// Content address of the blob being read.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Read the remaining bytes into a vector.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Directory of content-addressed blobs.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    chunk_size: usize,
}

impl StagingArea {
    /// Open (or create) a staging area with the given configuration.
    pub fn open(config: &StagingConfig) -> StagingResult<Self> {
        config.validate()?;
        for dir in [BLOB_DIR, TMP_DIR] {
            let path = config.root.join(dir);
            fs::create_dir_all(&path)
                .map_err(|e| StagingError::io(format!("creating {}", path.display()), e))?;
        }
        Ok(Self {
            root: config.root.clone(),
            chunk_size: config.chunk_size,
        })
    }

    /// Open a staging area at `root` with default settings.
    pub fn in_dir(root: impl Into<PathBuf>) -> StagingResult<Self> {
        Self::open(&StagingConfig::in_dir(root))
    }

    /// The directory this staging area lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of the blob with address `hash`.
    pub fn path_of(&self, hash: &ContentHash) -> PathBuf {
        self.root
            .join(BLOB_DIR)
            .join(hash.prefix())
            .join(hash.to_hex())
    }

    /// Whether a blob with address `hash` is staged.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.path_of(hash).is_file()
    }

    /// Hash `reader` and stage its bytes under the resulting address.
    ///
    /// The reader is consumed and dropped before this returns, on success
    /// and on failure alike.
    pub fn stage<R: Read>(&self, reader: R) -> StagingResult<StagedBlob> {
        let scratch = tempfile::NamedTempFile::new_in(self.root.join(TMP_DIR))
            .map_err(|e| StagingError::io("creating scratch file", e))?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, scratch);
        let (hash, size) = ContentHasher::copy_hashed(reader, &mut writer, self.chunk_size)
            .map_err(|e| StagingError::io("copying input stream to scratch file", e))?;
        let scratch = writer
            .into_inner()
            .map_err(|e| StagingError::io("flushing scratch file", e.into_error()))?;
        self.finalize(scratch, &hash)?;

        debug!(hash = %hash, size, "staged blob");
        Ok(StagedBlob { hash, size })
    }

    /// Stage an in-memory buffer.
    pub fn stage_bytes(&self, bytes: &[u8]) -> StagingResult<StagedBlob> {
        self.stage(bytes)
    }

    /// Stage the contents of the file at `path`.
    pub fn stage_file(&self, path: &Path) -> StagingResult<StagedBlob> {
        let file = File::open(path)
            .map_err(|e| StagingError::io(format!("opening {}", path.display()), e))?;
        self.stage(file)
    }

    /// Open a staged blob for reading. `Ok(None)` if it is not staged.
    pub fn open_blob(&self, hash: &ContentHash) -> StagingResult<Option<BlobReader>> {
        match File::open(self.path_of(hash)) {
            Ok(file) => Ok(Some(BlobReader {
                hash: *hash,
                inner: BufReader::with_capacity(self.chunk_size, file),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StagingError::io(format!("opening blob {hash}"), e)),
        }
    }

    /// Read a staged blob fully. `Ok(None)` if it is not staged.
    pub fn read(&self, hash: &ContentHash) -> StagingResult<Option<Vec<u8>>> {
        match self.open_blob(hash)? {
            Some(reader) => reader
                .into_bytes()
                .map(Some)
                .map_err(|e| StagingError::io(format!("reading blob {hash}"), e)),
            None => Ok(None),
        }
    }

    /// Stage bytes fetched from elsewhere under their known address.
    ///
    /// Fails with [`StagingError::DigestMismatch`] if `bytes` do not hash to
    /// `hash`; nothing is written in that case.
    pub fn materialize(&self, hash: &ContentHash, bytes: &[u8]) -> StagingResult<()> {
        if !ContentHasher::verify(bytes, hash) {
            return Err(StagingError::DigestMismatch {
                expected: *hash,
                computed: ContentHasher::digest(bytes),
            });
        }
        if self.contains(hash) {
            return Ok(());
        }
        let staged = self.stage_bytes(bytes)?;
        debug_assert_eq!(staged.hash, *hash);
        Ok(())
    }

    fn finalize(&self, scratch: tempfile::NamedTempFile, hash: &ContentHash) -> StagingResult<()> {
        let target = self.path_of(hash);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StagingError::io(format!("creating {}", parent.display()), e))?;
        }
        match scratch.persist(&target) {
            Ok(_) => Ok(()),
            // A concurrent stage of the same content got there first.
            Err(_) if target.is_file() => Ok(()),
            Err(e) => Err(StagingError::io(format!("finalizing blob {hash}"), e.error)),
        }
    }
}
