//! Generation history kept as a pretty-printed JSON array.

use casegen_application::{HistoryError, HistoryStore};
use casegen_domain::HistoryEntry;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// History file rewritten in full on every save.
///
/// Saves go through a sibling temporary file and a rename, so a crash
/// mid-write leaves the previous history intact.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Local::now().format("%Y%m%d_%H%M%S")));
        self.path.with_file_name(name)
    }

    /// Move an unreadable history aside so the next save does not erase it.
    fn set_aside(&self) {
        let backup = self.backup_path();
        match std::fs::rename(&self.path, &backup) {
            Ok(()) => warn!(
                path = %self.path.display(),
                backup = %backup.display(),
                "History file is corrupted, moved aside; starting a new history"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "History file is corrupted and could not be moved aside"
            ),
        }
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
            Ok(entries) => {
                debug!(path = %self.path.display(), entries = entries.len(), "History loaded");
                Ok(entries)
            }
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "History does not parse");
                self.set_aside();
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegen_domain::{HistoryMetadata, PhaseCosts, RequirementRecord, TaskOutput};

    fn entry(id: &str) -> HistoryEntry {
        let record = RequirementRecord::new("Login", "User logs in").with_id(id);
        let output = TaskOutput {
            prompt: "prompt".to_string(),
            full_prompt: "full prompt".to_string(),
            artifact: "[]".to_string(),
            costs: PhaseCosts::default(),
        };
        HistoryEntry::new(
            0,
            &record,
            &output,
            HistoryMetadata {
                format: "gherkin-plain".to_string(),
                source: "requirements_file".to_string(),
            },
        )
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("out").join("history.json"));

        store.save(&[entry("PRJ-1"), entry("PRJ-2")]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].requirement_id, "PRJ-2");
        assert!(!store.temp_path().exists());

        store.save(&loaded[..1]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupted_file_is_kept_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let broken = "[{\"requirement_id\": ";
        std::fs::write(&path, broken).unwrap();

        let store = JsonHistoryStore::new(&path);
        assert!(store.load().unwrap().is_empty());
        assert!(!path.exists());

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("history.json.corrupt-"))
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), broken);

        store.save(&[entry("PRJ-9")]).unwrap();
        assert_eq!(store.load().unwrap()[0].requirement_id, "PRJ-9");
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), broken);
    }
}
