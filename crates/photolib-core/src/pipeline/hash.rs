//! Content hashing for deduplication and content addressing.

use md5::{Digest, Md5};
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::types::ContentDigest;

/// Computes MD5 content digests.
pub struct Hasher;

impl Hasher {
    /// Hash the whole stream, then seek it back to the start.
    ///
    /// The caller gets the same handle back positioned at offset 0, ready for
    /// a second full read (the upload).
    pub async fn digest_stream<R>(stream: &mut R) -> std::io::Result<ContentDigest>
    where
        R: AsyncRead + AsyncSeek + Unpin,
    {
        let mut hasher = Md5::new();

        // 64KB chunks keep memory flat for large videos
        let mut buffer = vec![0u8; 65536];
        loop {
            let bytes_read = stream.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        stream.seek(SeekFrom::Start(0)).await?;
        Ok(ContentDigest::from_bytes(hasher.finalize().into()))
    }

    /// Hash a file on disk.
    pub async fn digest_file(path: &Path) -> std::io::Result<ContentDigest> {
        let mut file = tokio::fs::File::open(path).await?;
        Self::digest_stream(&mut file).await
    }

    /// Hash an in-memory byte buffer.
    pub fn digest_bytes(data: &[u8]) -> ContentDigest {
        ContentDigest::from_bytes(Md5::digest(data).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_stream_digest_matches_bytes() {
        let data = vec![7u8; 200_000];
        let mut cursor = Cursor::new(data.clone());
        let digest = Hasher::digest_stream(&mut cursor).await.unwrap();
        assert_eq!(digest, Hasher::digest_bytes(&data));
    }

    #[tokio::test]
    async fn test_stream_is_rewound() {
        let mut cursor = Cursor::new(b"rewind me".to_vec());
        Hasher::digest_stream(&mut cursor).await.unwrap();
        assert_eq!(cursor.position(), 0);

        let mut reread = String::new();
        cursor.read_to_string(&mut reread).await.unwrap();
        assert_eq!(reread, "rewind me");
    }

    #[tokio::test]
    async fn test_identical_content_identical_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("IMG_0001.jpg");
        let b = dir.path().join("nested").join("copy of photo.JPG");
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let da = Hasher::digest_file(&a).await.unwrap();
        let db = Hasher::digest_file(&b).await.unwrap();
        assert_eq!(da, db);
    }

    #[test]
    fn test_one_byte_difference_changes_digest() {
        let a = Hasher::digest_bytes(b"photo-bytes-0");
        let b = Hasher::digest_bytes(b"photo-bytes-1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            Hasher::digest_bytes(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_digest_matches_existing_library_keys() {
        assert_eq!(
            Hasher::digest_bytes(b"abc").to_hex(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[tokio::test]
    async fn test_stream_digest_spans_chunks() {
        // 1,000,000 'a' bytes crosses many 64KB reads.
        let mut cursor = Cursor::new(vec![b'a'; 1_000_000]);
        let digest = Hasher::digest_stream(&mut cursor).await.unwrap();
        assert_eq!(digest.to_hex(), "7707d6ae4e027c70eea2a935c2296f21");
    }

    #[tokio::test]
    async fn test_digest_missing_file() {
        assert!(Hasher::digest_file(Path::new("/nonexistent/file.jpg"))
            .await
            .is_err());
    }
}
