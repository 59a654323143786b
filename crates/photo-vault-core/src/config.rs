use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "photo-vault.db";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extensions (case-insensitive, with or without the dot) considered for backup.
    /// Empty means every regular file is a candidate.
    pub allowed_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// Only walk files modified after the last recorded copy.
    pub incremental: bool,
    pub db_file_name: String,
    pub check_free_space: bool,
    pub probe_video_dates: bool,
    pub ffprobe_path: String,
    pub mount: MountConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MountConfig {
    pub mount_point: PathBuf,
    pub mount_tool: String,
    pub unmount_tool: String,
    pub unmount_args: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: Vec::new(),
            ignore_patterns: Vec::new(),
            incremental: true,
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            check_free_space: true,
            probe_video_dates: true,
            ffprobe_path: "ffprobe".to_string(),
            mount: MountConfig::default(),
        }
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            mount_point: std::env::temp_dir().join("photo-vault-phone"),
            mount_tool: "ifuse".to_string(),
            unmount_tool: "fusermount".to_string(),
            unmount_args: vec!["-u".to_string()],
        }
    }
}

impl AppConfig {
    /// Ledger location for a destination root.
    pub fn db_path_for(&self, dest_root: &Path) -> PathBuf {
        dest_root.join(&self.db_file_name)
    }

    /// Allowed extensions in canonical form: lowercase, no leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

/// Load `Config.toml` from the working directory (optional) and apply
/// `PHOTO_VAULT_*` environment overrides, e.g. `PHOTO_VAULT_INCREMENTAL=false`
/// or `PHOTO_VAULT_MOUNT__MOUNT_POINT=/mnt/phone`.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("PHOTO_VAULT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
