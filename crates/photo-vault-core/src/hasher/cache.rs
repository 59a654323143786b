use super::fingerprint::{hash_of, ContentHash};
use crate::error::Error;
use crate::storage::Ledger;
use std::path::Path;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSource {
    /// Reused from a ledger row with the same (path, size, mtime).
    IdentityCache,
    Computed,
}

/// Resolve a file's content hash, consulting the ledger's identity cache
/// before reading the file.
///
/// A cache hit only proves the file was characterised before; the caller
/// still has to ask the ledger whether the content is recorded.
pub fn resolve_hash(
    ledger: &Ledger,
    file: &Path,
    size: i64,
    modification_time: f64,
) -> Result<(ContentHash, HashSource), Error> {
    let origin = file.to_string_lossy();
    if let Some(hex) = ledger.lookup_cached_hash(&origin, size, modification_time)? {
        trace!("Found hash for {} in ledger identity cache", file.display());
        return Ok((ContentHash::from_hex(hex), HashSource::IdentityCache));
    }
    trace!("No cached hash for {}, hashing", file.display());
    Ok((hash_of(file)?, HashSource::Computed))
}
