//! Recursive directory crawl feeding the upload queue.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::UploadConfig;
use crate::error::CrawlError;
use crate::types::MediaFile;

use super::queue::QueueWriter;

/// Walks a directory tree and queues every eligible media file.
pub struct Crawler {
    extensions: Vec<String>,
}

impl Crawler {
    /// Create a crawler accepting the configured extensions.
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
        }
    }

    /// Crawl `root`, pushing eligible files into `queue`.
    ///
    /// Entries are visited in file-name order, subdirectory contents before
    /// the directory itself. A file that cannot be classified is logged and
    /// skipped; a directory that cannot be listed aborts the crawl, and the
    /// error records how many files were queued before it. Returns the number
    /// of files queued.
    pub fn crawl(&self, root: &Path, queue: &QueueWriter<MediaFile>) -> Result<usize, CrawlError> {
        if !root.is_dir() {
            return Err(CrawlError::NotADirectory(root.to_path_buf()));
        }

        let mut queued = 0;
        for entry in WalkDir::new(root).contents_first(true).sort_by_file_name() {
            let entry = entry.map_err(|e| CrawlError::Traversal {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                message: e.to_string(),
                queued,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            match self.classify(entry.path()) {
                Ok(Some(extension)) => {
                    let path = std::path::absolute(entry.path())
                        .unwrap_or_else(|_| entry.path().to_path_buf());
                    if queue.push(MediaFile { path, extension }) {
                        queued += 1;
                    } else {
                        tracing::warn!("Upload queue closed early, stopping crawl");
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => {
                    tracing::warn!("Could not parse file {:?} - {}", entry.path(), message);
                }
            }
        }

        Ok(queued)
    }

    /// Return the normalized extension if the file is eligible.
    fn classify(&self, path: &Path) -> Result<Option<String>, String> {
        let extension = file_extension(path)?;
        Ok(extension.filter(|ext| self.is_supported(ext)))
    }

    /// Check if an already-normalized extension is on the allow-list.
    pub fn is_supported(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Extension of `path`: the text after the final `.` of the file name,
/// trimmed and lowercased. A name without a dot has no extension.
pub fn file_extension(path: &Path) -> Result<Option<String>, String> {
    let name = path
        .file_name()
        .ok_or_else(|| "path has no file name".to_string())?
        .to_str()
        .ok_or_else(|| "file name is not valid UTF-8".to_string())?;
    Ok(name.rsplit_once('.').map(|(_, ext)| normalize_extension(ext)))
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
