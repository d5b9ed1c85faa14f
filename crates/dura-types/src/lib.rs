//! Foundation types for dura.
//!
//! Every other dura crate depends on `dura-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- SHA-256 content address of a binary blob
//! - [`StorageKey`] -- validated hierarchical key for key-value stores

pub mod error;
pub mod hash;
pub mod key;

pub use error::TypeError;
pub use hash::ContentHash;
pub use key::StorageKey;
