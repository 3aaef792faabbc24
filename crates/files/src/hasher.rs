//! Content hashing for duplicate detection.
//!
//! Digests are MD5 and are only ever compared for equality. They are not a security
//! boundary. Files are streamed through a fixed-size buffer so large sources are hashed
//! without being loaded into memory, and a file and a buffer holding the same bytes
//! always produce the same digest.

use crate::model::FileSource;
use crate::{FilesError, FilesResult};
use md5::{Digest, Md5};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Fixed-size fingerprint of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// Lowercase hexadecimal form of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashes everything `reader` yields.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Md5::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&chunk[..read]);
    }

    Ok(ContentDigest(hasher.finalize().into()))
}

/// Hashes an in-memory buffer.
pub fn hash_buffer(bytes: &[u8]) -> ContentDigest {
    ContentDigest(Md5::digest(bytes).into())
}

/// Hashes the file at `path`.
///
/// # Errors
///
/// Returns [`FilesError::Hash`] if the file does not exist or cannot be read.
pub fn hash_path(path: &Path) -> FilesResult<ContentDigest> {
    let file = fs::File::open(path).map_err(|source| FilesError::Hash {
        path: path.to_path_buf(),
        source,
    })?;

    hash_reader(io::BufReader::new(file)).map_err(|source| FilesError::Hash {
        path: path.to_path_buf(),
        source,
    })
}

/// Hashes a descriptor's source, whichever form it takes.
pub fn hash_source(source: &FileSource) -> FilesResult<ContentDigest> {
    match source {
        FileSource::Path(path) => hash_path(path),
        FileSource::Buffer(bytes) => Ok(hash_buffer(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_buffer(b"hello").to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(hash_buffer(b"").to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_file_and_buffer_digests_match() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        assert_eq!(hash_path(&path).unwrap(), hash_buffer(&content));
        assert_eq!(
            hash_source(&FileSource::Path(path)).unwrap(),
            hash_source(&FileSource::Buffer(content)).unwrap()
        );
    }

    #[test]
    fn test_different_content_differs() {
        assert_ne!(hash_buffer(b"hello"), hash_buffer(b"hello!"));
    }

    #[test]
    fn test_missing_path_is_hash_error() {
        let temp = TempDir::new().unwrap();
        let result = hash_path(&temp.path().join("absent.txt"));
        assert!(matches!(result, Err(FilesError::Hash { .. })));
    }

    #[test]
    fn test_digest_display_is_hex() {
        let digest = hash_buffer(b"abc");
        assert_eq!(digest.to_string(), digest.to_hex());
        assert_eq!(digest.to_string().len(), 32);
    }
}
