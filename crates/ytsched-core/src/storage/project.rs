//! Per-project JSON documents: cadence preferences, default video
//! metadata, channel info, and the embedded upload ledger.
//!
//! Saves are atomic (write-to-temp then rename), so a reader only ever
//! observes the prior complete document or the new complete document,
//! never a partial write.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::ledger::UploadLedger;
use crate::schedule::{to_rfc3339_utc, Cadence};

/// One project: an isolated channel/upload-directory pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub created_at: String,

    /// Directory scanned for candidate video files.
    #[serde(default)]
    pub upload_dir: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_videos_per_day")]
    pub videos_per_day: u32,
    /// Local time the day's schedule starts, "HH:MM".
    #[serde(default = "default_day_start")]
    pub day_start_time: String,
    #[serde(default)]
    pub made_for_kids: bool,

    // Defaults applied to all uploads; overridable per run.
    #[serde(default)]
    pub default_title: Option<String>,
    #[serde(default)]
    pub default_description: Option<String>,
    #[serde(default)]
    pub default_tags: Option<Vec<String>>,
    #[serde(default)]
    pub default_category_id: Option<String>,

    // OAuth / channel info.
    #[serde(default)]
    pub client_secrets_path: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,

    /// Completed transfers. Reserved publish slots are derived from
    /// these records, not stored separately.
    #[serde(default)]
    pub uploaded: UploadLedger,
}

fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_videos_per_day() -> u32 {
    1
}
fn default_day_start() -> String {
    "09:00".to_string()
}

impl Project {
    pub fn new(name: String) -> Self {
        Self {
            name,
            created_at: to_rfc3339_utc(Utc::now()),
            upload_dir: None,
            timezone: default_timezone(),
            videos_per_day: default_videos_per_day(),
            day_start_time: default_day_start(),
            made_for_kids: false,
            default_title: None,
            default_description: None,
            default_tags: None,
            default_category_id: None,
            client_secrets_path: None,
            channel_id: None,
            channel_title: None,
            uploaded: UploadLedger::default(),
        }
    }

    /// The project's publishing cadence.
    pub fn cadence(&self) -> Cadence {
        Cadence {
            timezone: self.timezone.clone(),
            videos_per_day: self.videos_per_day,
            day_start: self.day_start_time.clone(),
        }
    }
}

/// Normalizes a user-supplied project name to a safe file stem: runs of
/// characters outside `[A-Za-z0-9._-]` collapse to a single `-`, leading
/// and trailing `-` are trimmed.
pub fn normalize_name(name: &str) -> Result<String, StorageError> {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_matches('-').to_string();
    if !out.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(out)
}

/// Project persistence: atomic load/save/list/delete by name.
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Opens the store under the default data directory.
    pub fn open() -> Result<Self, StorageError> {
        Self::at(super::data_dir()?.join("projects"))
    }

    /// Opens the store rooted at an explicit directory.
    pub fn at(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Path of the project document for `name`.
    pub fn project_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(format!("{}.json", normalize_name(name)?)))
    }

    /// Path of the OAuth token file for `name`.
    pub fn token_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(format!("{}.token.json", normalize_name(name)?)))
    }

    /// Sorted list of saved project names.
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StorageError::Io {
                    path: self.root.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    // Token files are <name>.token.json.
                    if !stem.ends_with(".token") {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<Project, StorageError> {
        let path = self.project_path(name)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically persists the project document.
    pub fn save(&self, project: &Project) -> Result<PathBuf, StorageError> {
        let path = self.project_path(&project.name)?;
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(project)?;
        std::fs::write(&tmp, content).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Creates and persists a fresh project, failing if one exists.
    pub fn create(&self, name: &str) -> Result<Project, StorageError> {
        let safe = normalize_name(name)?;
        if self.project_path(&safe)?.exists() {
            return Err(StorageError::AlreadyExists(safe));
        }
        let project = Project::new(safe);
        self.save(&project)?;
        Ok(project)
    }

    /// Deletes the project document and its token file, if present.
    /// Does not touch uploaded videos. Returns whether a document existed.
    pub fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.project_path(name)?;
        let existed = path.exists();
        if existed {
            std::fs::remove_file(&path).map_err(|source| StorageError::Io { path, source })?;
        }
        let token = self.token_path(name)?;
        if token.exists() {
            std::fs::remove_file(&token).map_err(|source| StorageError::Io {
                path: token.clone(),
                source,
            })?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ContentIdentity;
    use crate::ledger::UploadRecord;
    use tempfile::TempDir;

    fn store() -> (TempDir, ProjectStore) {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::at(dir.path().join("projects")).unwrap();
        (dir, store)
    }

    #[test]
    fn normalize_name_replaces_unsafe_runs() {
        assert_eq!(normalize_name("my channel 2026").unwrap(), "my-channel-2026");
        assert_eq!(normalize_name("  a/b\\c  ").unwrap(), "a-b-c");
        assert_eq!(normalize_name("ok_name.v2").unwrap(), "ok_name.v2");
        assert_eq!(normalize_name("--hello--").unwrap(), "hello");
        assert!(normalize_name("///").is_err());
        assert!(normalize_name("").is_err());
        assert!(normalize_name("-._-").is_err());
    }

    #[test]
    fn create_load_roundtrip() {
        let (_dir, store) = store();
        let created = store.create("demo channel").unwrap();
        assert_eq!(created.name, "demo-channel");

        let loaded = store.load("demo channel").unwrap();
        assert_eq!(loaded.name, "demo-channel");
        assert_eq!(loaded.timezone, "UTC");
        assert_eq!(loaded.videos_per_day, 1);
        assert_eq!(loaded.day_start_time, "09:00");
        assert!(loaded.uploaded.is_empty());
    }

    #[test]
    fn create_twice_fails() {
        let (_dir, store) = store();
        store.create("demo").unwrap();
        let err = store.create("demo").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn save_persists_ledger_and_leaves_no_temp_file() {
        let (_dir, store) = store();
        let mut project = store.create("demo").unwrap();
        project
            .uploaded
            .append(UploadRecord::new(
                "a.mp4".into(),
                ContentIdentity {
                    digest: "d1".into(),
                    size: 100,
                },
                "vid1".into(),
                Some("2026-01-01T09:00:00Z".into()),
            ))
            .unwrap();
        let path = store.save(&project).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let loaded = store.load("demo").unwrap();
        assert_eq!(loaded.uploaded.len(), 1);
        assert!(loaded
            .uploaded
            .reserved_slots()
            .contains("2026-01-01T09:00:00Z"));
    }

    #[test]
    fn list_excludes_token_files() {
        let (_dir, store) = store();
        store.create("beta").unwrap();
        store.create("alpha").unwrap();
        std::fs::write(store.token_path("alpha").unwrap(), "{}").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn delete_removes_project_and_token() {
        let (_dir, store) = store();
        store.create("demo").unwrap();
        std::fs::write(store.token_path("demo").unwrap(), "{}").unwrap();

        assert!(store.delete("demo").unwrap());
        assert!(!store.project_path("demo").unwrap().exists());
        assert!(!store.token_path("demo").unwrap().exists());
        assert!(!store.delete("demo").unwrap());
    }
}
