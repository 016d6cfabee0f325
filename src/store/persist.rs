// Store persistence module
// Saves the data snapshot to a TOML file after every write

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::models::{Category, Page, User, UserProfile};
use super::StoreError;
use crate::logger;

/// Everything the store holds, serialized as one TOML document
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Snapshot {
    /// Last id handed out; ids are never reused
    #[serde(default)]
    pub last_id: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<UserProfile>,
}

impl Snapshot {
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Snapshot file location; `None` keeps the store in memory only
#[derive(Debug, Clone, Default)]
pub struct SnapshotFile {
    path: Option<PathBuf>,
}

impl SnapshotFile {
    pub fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(PathBuf::from),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the snapshot; a missing file yields an empty one
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(Snapshot::default());
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                logger::log_info(&format!(
                    "No data file at {}, starting empty",
                    path.display()
                ));
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot = toml::from_str(&content)?;
        logger::log_info(&format!("Loaded data snapshot from {}", path.display()));
        Ok(snapshot)
    }

    /// Write the snapshot to a sibling temp file and rename it into place
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let content = toml::to_string_pretty(snapshot)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = temp_sibling(path);
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
