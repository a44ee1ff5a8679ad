//! Storage key derivation shared by every backend.
//!
//! Key format: `{orientation}/{random}.{ext}` for videos and `{random}.{ext}` for
//! thumbnails. The extension is the content type's subtype; nothing else the
//! caller sends ends up in the key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tubely_core::{AppError, Orientation};

/// Bytes of randomness per key (256 bits).
pub const RANDOM_KEY_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Unrecognized content type: {0:?}")]
    UnrecognizedContentType(String),
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        AppError::UnsupportedContentType(err.to_string())
    }
}

/// Source of key randomness; swapped for a fixed source in tests.
pub trait RandomSource: Send + Sync {
    fn fill_bytes(&self, buf: &mut [u8]);
}

/// Thread-local CSPRNG seeded from the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}

/// File extension for a declared content type.
///
/// `video/mp4; codecs=avc1` becomes `mp4`. Only `[a-z0-9+-]` survives, so the
/// result can never form a path segment like `..`.
pub fn extension_for(content_type: &str) -> Result<String, KeyError> {
    let unrecognized = || KeyError::UnrecognizedContentType(content_type.to_string());

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/').ok_or_else(unrecognized)?;
    let subtype = subtype.trim().to_ascii_lowercase();

    if kind.trim().is_empty() || subtype.is_empty() {
        return Err(unrecognized());
    }
    if !subtype
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '+' || c == '-')
    {
        return Err(unrecognized());
    }

    Ok(subtype)
}

#[derive(Clone)]
pub struct KeyDeriver {
    random: Arc<dyn RandomSource>,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}

impl KeyDeriver {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Derive a fresh object key, partitioned by orientation when one is given.
    pub fn derive_key(
        &self,
        bucket: Option<Orientation>,
        content_type: &str,
    ) -> Result<String, KeyError> {
        let ext = extension_for(content_type)?;

        let mut raw = [0u8; RANDOM_KEY_BYTES];
        self.random.fill_bytes(&mut raw);
        let id = URL_SAFE_NO_PAD.encode(raw);

        Ok(match bucket {
            Some(orientation) => format!("{}/{}.{}", orientation.as_str(), id, ext),
            None => format!("{}.{}", id, ext),
        })
    }
}
