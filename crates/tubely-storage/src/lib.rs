//! Tubely Storage Library
//!
//! Object storage abstraction for published media, with S3 and local filesystem
//! backends, plus the key derivation used to name every published object.
//!
//! # Storage key format
//!
//! - **Videos**: `{orientation}/{random}.{ext}`, e.g. `landscape/3q2-....mp4`
//! - **Thumbnails**: `{random}.{ext}`
//!
//! The random component is 32 bytes of CSPRNG output, URL-safe base64 encoded.
//! Keys never contain `..` or a leading `/`, and no part of them comes from the
//! caller verbatim.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{KeyDeriver, KeyError, OsRandom, RandomSource};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectReader, Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
