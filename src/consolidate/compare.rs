//! Exact byte-for-byte content comparison.
//!
//! No hashing, no caching: two files are read side by side in matched
//! fixed-size chunks and declared different at the first mismatch. An
//! unreadable file is a non-match, never a fatal error — the pair is
//! simply not consolidated and the run continues.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

/// Chunk size for the paired reads.
const CHUNK_SIZE: usize = 64 * 1024;

/// Result of comparing two files' content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Every byte matched, including the empty/empty case.
    Equal,
    /// Lengths or bytes differ.
    Different,
    /// One side could not be opened or read; treated as a non-match.
    Unreadable,
}

/// Compare two files byte for byte.
///
/// Reads both files in matched chunks, returning [`Comparison::Different`]
/// as soon as a chunk length or byte differs. Two zero-length files
/// compare [`Comparison::Equal`].
#[must_use]
pub fn compare(a: &Path, b: &Path) -> Comparison {
    let mut file_a = match File::open(a) {
        Ok(f) => f,
        Err(e) => {
            log::debug!("cannot open {}: {}", a.display(), e);
            return Comparison::Unreadable;
        }
    };
    let mut file_b = match File::open(b) {
        Ok(f) => f,
        Err(e) => {
            log::debug!("cannot open {}: {}", b.display(), e);
            return Comparison::Unreadable;
        }
    };

    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let got_a = match fill(&mut file_a, &mut buf_a) {
            Ok(n) => n,
            Err(e) => {
                log::debug!("cannot read {}: {}", a.display(), e);
                return Comparison::Unreadable;
            }
        };
        let got_b = match fill(&mut file_b, &mut buf_b) {
            Ok(n) => n,
            Err(e) => {
                log::debug!("cannot read {}: {}", b.display(), e);
                return Comparison::Unreadable;
            }
        };

        // Full chunks on both sides except at end of file, so a length
        // mismatch means one file ended early.
        if got_a != got_b {
            return Comparison::Different;
        }
        if got_a == 0 {
            return Comparison::Equal;
        }
        if buf_a[..got_a] != buf_b[..got_b] {
            return Comparison::Different;
        }
    }
}

/// Read until the buffer is full or the stream ends, retrying short reads.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[test]
    fn test_identical_files_compare_equal() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"the same bytes");
        let b = write_file(&dir, "b", b"the same bytes");
        assert_eq!(compare(&a, &b), Comparison::Equal);
    }

    #[test]
    fn test_same_length_different_bytes() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"abcdef");
        let b = write_file(&dir, "b", b"abcdeX");
        assert_eq!(compare(&a, &b), Comparison::Different);
    }

    #[test]
    fn test_prefix_relation_is_different() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"abc");
        let b = write_file(&dir, "b", b"abcdef");
        assert_eq!(compare(&a, &b), Comparison::Different);
        assert_eq!(compare(&b, &a), Comparison::Different);
    }

    #[test]
    fn test_empty_files_compare_equal() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"");
        let b = write_file(&dir, "b", b"");
        assert_eq!(compare(&a, &b), Comparison::Equal);
    }

    #[test]
    fn test_files_larger_than_one_chunk() {
        let dir = TempDir::new().unwrap();
        let big: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let a = write_file(&dir, "a", &big);
        let b = write_file(&dir, "b", &big);
        assert_eq!(compare(&a, &b), Comparison::Equal);

        let mut tweaked = big.clone();
        // Mismatch in the second chunk.
        tweaked[CHUNK_SIZE + 100] ^= 0xff;
        let c = write_file(&dir, "c", &tweaked);
        assert_eq!(compare(&a, &c), Comparison::Different);
    }

    #[test]
    fn test_difference_at_chunk_boundary() {
        let dir = TempDir::new().unwrap();
        let base: Vec<u8> = vec![7u8; CHUNK_SIZE];
        let mut longer = base.clone();
        longer.push(7);
        let a = write_file(&dir, "a", &base);
        let b = write_file(&dir, "b", &longer);
        assert_eq!(compare(&a, &b), Comparison::Different);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"x");
        let ghost = dir.path().join("ghost");
        assert_eq!(compare(&a, &ghost), Comparison::Unreadable);
        assert_eq!(compare(&ghost, &a), Comparison::Unreadable);
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"x");
        // Opening a directory succeeds on Linux but reading it fails.
        assert_eq!(compare(&a, dir.path()), Comparison::Unreadable);
    }
}
