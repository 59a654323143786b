pub mod cache;
pub mod fingerprint;

pub use cache::{resolve_hash, HashSource};
pub use fingerprint::{hash_of, ContentHash};
