//! Service configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present); CLI flags override them.
//!
//! | Variable                  | Default   |
//! |---------------------------|-----------|
//! | `SHORTFALL_STORAGE_DIR`   | `storage` |
//! | `SHORTFALL_PORT`          | `8000`    |
//! | `SHORTFALL_MAX_UPLOAD_MB` | `50`      |
//! | `SHORTFALL_SHEET`         | first sheet |

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::parser::SheetSelector;

/// Default storage root, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "storage";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload size limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the input/output/status layout
    pub storage_dir: PathBuf,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Worksheet processed for every upload
    pub sheet: SheetSelector,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            sheet: SheetSelector::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("SHORTFALL_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(port) = lookup("SHORTFALL_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SHORTFALL_PORT",
                value: port.clone(),
            })?;
        }

        if let Some(mb) = lookup("SHORTFALL_MAX_UPLOAD_MB") {
            let megabytes: usize = mb.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SHORTFALL_MAX_UPLOAD_MB",
                value: mb.clone(),
            })?;
            config.max_upload_bytes = megabytes.saturating_mul(1024 * 1024);
        }

        if let Some(sheet) = lookup("SHORTFALL_SHEET") {
            if let Ok(selector) = sheet.parse() {
                config.sheet = selector;
            }
        }

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_dir)
    }
}

/// On-disk layout of uploads, results and the job status file.
///
/// ```text
/// <root>/input/<task_id><ext>
/// <root>/output/<task_id>.xlsx
/// <root>/tasks.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn status_file(&self) -> PathBuf {
        self.root.join("tasks.json")
    }

    /// Where an upload is stored; keeps the uploaded file's extension.
    pub fn input_path(&self, task_id: &str, file_name: Option<&str>) -> PathBuf {
        let suffix = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        self.input_dir().join(format!("{}{}", task_id, suffix))
    }

    pub fn output_path(&self, task_id: &str) -> PathBuf {
        self.output_dir().join(format!("{}.xlsx", task_id))
    }

    /// Create the input and output directories.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.input_dir())?;
        fs::create_dir_all(self.output_dir())
    }
}
