//! Capture metadata extraction from embedded EXIF data.

use chrono::{NaiveDate, NaiveDateTime};
use exif::{DateTime, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::types::{CaptureMetadata, Orientation};

/// Extracts capture time and orientation from media files.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract capture metadata from a file.
    ///
    /// Never fails: files without EXIF (most videos, screenshots) or with
    /// unreadable tags fall back to the current time and `Orientation::None`.
    /// Each field falls back independently.
    pub fn extract(path: &Path) -> CaptureMetadata {
        let fallback = CaptureMetadata::fallback();
        let Some(exif) = Self::read_exif(path) else {
            tracing::debug!("No EXIF data in {:?}, using defaults", path);
            return fallback;
        };

        let orientation = Self::get_orientation(&exif).unwrap_or(fallback.orientation);
        match Self::get_datetime(&exif) {
            Some(captured_at) => CaptureMetadata {
                captured_at,
                utc_offset: None,
                orientation,
            },
            None => CaptureMetadata {
                orientation,
                ..fallback
            },
        }
    }

    fn read_exif(path: &Path) -> Option<exif::Exif> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);
        Reader::new().read_from_container(&mut reader).ok()
    }

    /// Original capture time, with sub-second precision when recorded.
    fn get_datetime(exif: &exif::Exif) -> Option<NaiveDateTime> {
        let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
        let Value::Ascii(ref parts) = field.value else {
            return None;
        };
        let mut dt = DateTime::from_ascii(parts.first()?).ok()?;

        if let Some(subsec) = exif.get_field(Tag::SubSecTimeOriginal, In::PRIMARY) {
            if let Value::Ascii(ref parts) = subsec.value {
                if let Some(bytes) = parts.first() {
                    let _ = dt.parse_subsec(bytes);
                }
            }
        }

        Self::to_naive(&dt)
    }

    fn to_naive(dt: &DateTime) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?.and_hms_nano_opt(
            dt.hour.into(),
            dt.minute.into(),
            dt.second.into(),
            dt.nanosecond.unwrap_or(0),
        )
    }

    fn get_orientation(exif: &exif::Exif) -> Option<Orientation> {
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .map(Orientation::from_exif)
    }
}
