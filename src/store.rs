//! Flat-file persistence for the reservation list.
//!
//! The whole sequence is read and written on every access. Nothing is cached
//! between calls, so the file on disk is always the source of truth.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::log_event;

/// Format used for `since` on occupied records.
pub const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    #[serde(rename = "libre")]
    Free,
    #[serde(rename = "ocupado")]
    Occupied,
}

/// One reservable server as it appears in the backing file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerRecord {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado")]
    pub state: ServerState,
    #[serde(rename = "usuario", default, deserialize_with = "null_as_empty")]
    pub user: String,
    #[serde(rename = "hora", default, deserialize_with = "null_as_empty")]
    pub since: String,
    /// Fields we don't know about, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ServerRecord {
    pub fn free(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ServerState::Free,
            user: String::new(),
            since: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == ServerState::Free
    }

    /// Free records carry no holder and no timestamp; occupied records
    /// carry both.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            ServerState::Free => self.user.is_empty() && self.since.is_empty(),
            ServerState::Occupied => !self.user.is_empty() && !self.since.is_empty(),
        }
    }

    pub(crate) fn occupy(&mut self, user: &str) {
        self.state = ServerState::Occupied;
        self.user = user.to_string();
        self.since = chrono::Local::now().format(SINCE_FORMAT).to_string();
    }

    pub(crate) fn vacate(&mut self) {
        self.state = ServerState::Free;
        self.user.clear();
        self.since.clear();
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record. A missing or malformed file yields an empty list.
    pub fn load(&self) -> Vec<ServerRecord> {
        match self.load_strict() {
            Ok(records) => records,
            Err(e) => {
                log_event(&format!(
                    "⚠️  Store {} unreadable, treating as empty: {:#}",
                    self.path.display(),
                    e
                ));
                Vec::new()
            }
        }
    }

    /// Like [`Store::load`] but reports malformed content instead of hiding it.
    /// A missing file is still an empty list.
    pub fn load_strict(&self) -> Result<Vec<ServerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store: {:?}", self.path))?;
        let records = serde_json::from_str(&content)
            .with_context(|| format!("Malformed store: {:?}", self.path))?;
        Ok(records)
    }

    /// Overwrite the backing file with `records`.
    ///
    /// Goes through a sibling temp file and a rename, so the target is either
    /// the old content or the new content, never a partial write.
    pub fn save(&self, records: &[ServerRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create store dir: {:?}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        {
            let mut file = fs::File::create(&tmp_path)
                .with_context(|| format!("Failed to create temp file: {:?}", tmp_path))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write temp file: {:?}", tmp_path))?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("Failed to replace store: {:?}", self.path));
        }
        Ok(())
    }
}
