use crate::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BLOCK_SIZE: usize = 64 * 1024;

/// Lowercase hex BLAKE3 digest of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a digest read back from the ledger.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        ContentHash(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream `file` through BLAKE3 in fixed-size blocks.
///
/// Only the bytes matter: two files with identical content hash the same
/// regardless of name, location or timestamps.
pub fn hash_of(file: &Path) -> Result<ContentHash, Error> {
    hash_reader(File::open(file).map_err(|source| hash_error(file, source))?)
        .map_err(|source| hash_error(file, source))
}

fn hash_reader(mut reader: impl Read) -> io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(ContentHash(hasher.finalize().to_hex().to_string()))
}

fn hash_error(path: &Path, source: io::Error) -> Error {
    Error::Hash {
        path: path.to_path_buf(),
        source,
    }
}
