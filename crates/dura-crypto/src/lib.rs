//! Content hashing for dura.
//!
//! Every binary blob is addressed by the SHA-256 digest of its bytes. This
//! crate wraps the `sha2` implementation behind [`ContentHasher`], which
//! supports one-shot, incremental, and reader-driven hashing.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, DEFAULT_CHUNK_SIZE};
