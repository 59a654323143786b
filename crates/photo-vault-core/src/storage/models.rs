/// One copied file, unique by content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub origin_path: String,
    pub destination_path: Option<String>,
    pub content_hash: String,
    pub size: i64,
    /// Seconds since the epoch, as read from the origin file before hashing.
    pub modification_time: f64,
    /// RFC 3339, UTC.
    pub copied_at: Option<String>,
}

/// A row about to be inserted; `id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub origin_path: String,
    pub destination_path: String,
    pub content_hash: String,
    pub size: i64,
    pub modification_time: f64,
    pub copied_at: String,
}
