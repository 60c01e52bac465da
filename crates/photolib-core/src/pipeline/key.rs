//! Destination key derivation.
//!
//! Keys have the form `/{yyyy}/{MM}/{dd}/{hex digest}.{ext}`. Objects already
//! in the store are looked up by this exact string, so the layout must stay
//! stable across releases.

use chrono::Datelike;
use std::fmt;

use crate::types::{CaptureMetadata, ContentDigest};

/// Canonical location of a media file in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationKey(String);

impl DestinationKey {
    /// Derive the key from capture metadata, content digest and extension.
    pub fn derive(metadata: &CaptureMetadata, digest: &ContentDigest, extension: &str) -> Self {
        let date = metadata.captured_at.date();
        Self(format!(
            "/{:04}/{:02}/{:02}/{}.{}",
            date.year(),
            date.month(),
            date.day(),
            digest.to_hex(),
            extension.trim().trim_start_matches('.').to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DestinationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DestinationKey> for String {
    fn from(key: DestinationKey) -> Self {
        key.0
    }
}
