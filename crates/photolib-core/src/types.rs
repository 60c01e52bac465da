//! Core data types flowing through the upload pipeline.

use chrono::{FixedOffset, NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A file discovered by the crawler and queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Absolute path to the source file
    pub path: PathBuf,

    /// Lowercase extension without the leading dot ("jpg", "heic", ...)
    pub extension: String,
}

/// EXIF orientation of an image.
///
/// Values 1-8 are the standard EXIF orientations; `None` covers files that carry
/// no orientation tag at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
    /// A tag value outside the EXIF range
    Unrecognized(u32),
}

impl Orientation {
    /// Map a raw EXIF orientation value onto the enumeration.
    pub fn from_exif(value: u32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::TopLeft,
            2 => Self::TopRight,
            3 => Self::BottomRight,
            4 => Self::BottomLeft,
            5 => Self::LeftTop,
            6 => Self::RightTop,
            7 => Self::RightBottom,
            8 => Self::LeftBottom,
            other => Self::Unrecognized(other),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::TopLeft => write!(f, "TopLeft"),
            Self::TopRight => write!(f, "TopRight"),
            Self::BottomRight => write!(f, "BottomRight"),
            Self::BottomLeft => write!(f, "BottomLeft"),
            Self::LeftTop => write!(f, "LeftTop"),
            Self::RightTop => write!(f, "RightTop"),
            Self::RightBottom => write!(f, "RightBottom"),
            Self::LeftBottom => write!(f, "LeftBottom"),
            Self::Unrecognized(value) => write!(f, "{value}"),
        }
    }
}

/// Best-effort capture information recovered from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMetadata {
    /// When the media was captured, or the time of extraction if unknown
    pub captured_at: NaiveDateTime,

    /// Local UTC offset, known only when `captured_at` came from the clock.
    /// EXIF capture times carry no offset.
    pub utc_offset: Option<FixedOffset>,

    /// EXIF orientation
    pub orientation: Orientation,
}

impl CaptureMetadata {
    /// Metadata for a file with no usable embedded information.
    pub fn fallback() -> Self {
        let now = chrono::Local::now();
        Self {
            captured_at: now.naive_local(),
            utc_offset: Some(*now.offset()),
            orientation: Orientation::None,
        }
    }

    /// Capture time as an ISO-8601 round-trip string.
    ///
    /// Seven fractional digits, e.g. `2023-05-10T14:30:00.0000000`, followed
    /// by the offset (`+02:00`) when one is known.
    pub fn iso_date(&self) -> String {
        // chrono has no 7-digit fraction specifier; ticks are 100ns units.
        let ticks = self.captured_at.nanosecond() % 1_000_000_000 / 100;
        let mut date = format!("{}.{ticks:07}", self.captured_at.format("%Y-%m-%dT%H:%M:%S"));
        if let Some(offset) = self.utc_offset {
            date.push_str(&offset.to_string());
        }
        date
    }

    /// The metadata attached to an uploaded object.
    pub fn upload_record(&self) -> UploadRecord {
        UploadRecord {
            date: self.iso_date(),
            orientation: self.orientation.to_string(),
        }
    }
}

/// 16-byte MD5 digest of a file's full contents.
///
/// MD5 is what existing libraries are keyed by; it identifies content here
/// and is not relied on for integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Lowercase hex rendering used in destination keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Metadata stored alongside an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// ISO-8601 capture timestamp
    pub date: String,

    /// String form of the [`Orientation`]
    pub orientation: String,
}

impl UploadRecord {
    /// Flatten into the key/value map handed to the storage gateway.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("date".to_string(), self.date.clone()),
            ("orientation".to_string(), self.orientation.clone()),
        ])
    }
}

/// Successful outcome of processing one queued file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The file was written to the store
    Uploaded { key: String, bytes: u64 },

    /// An object already existed at the key and overwrite is disabled
    Skipped { key: String },
}

/// Tally of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files queued by the crawler
    pub discovered: u64,

    /// Files uploaded
    pub uploaded: u64,

    /// Files skipped because their key already existed
    pub skipped: u64,

    /// Files that failed at any step
    pub failed: u64,

    /// Bytes transferred for uploaded files
    pub bytes_uploaded: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of files that reached a final state.
    pub fn processed(&self) -> u64 {
        self.uploaded + self.skipped + self.failed
    }
}
