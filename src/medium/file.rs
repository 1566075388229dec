//! Directory-backed storage medium.
//!
//! Each item is one file named after the SHA-256 of its key, so every key
//! maps to a safe, fixed-length file name. The file holds the key next to
//! the value, which is how `keys` lists the directory. Items survive process
//! restarts.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::MediumError;
use crate::medium::StorageMedium;

const ITEM_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// On-disk layout of one item.
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    key: String,
    value: String,
}

/// Stores items as files in a single directory.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Uses the platform cache directory for `app_name`
    /// (`~/.cache/<app_name>/` on Linux).
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn for_app(app_name: &str) -> Option<Self> {
        let dirs = ProjectDirs::from("", "", app_name)?;
        Some(Self::with_dir(dirs.cache_dir()))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", file_stem(key), ITEM_EXTENSION))
    }
}

impl StorageMedium for FileMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError> {
        let content = match fs::read_to_string(self.item_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<StoredItem>(&content) {
            Ok(item) if item.key == key => Ok(Some(item.value)),
            Ok(_) => Ok(None),
            // A damaged file is handed up as-is; the durable tier discards it.
            Err(_) => Ok(Some(content)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError> {
        fs::create_dir_all(&self.dir)?;

        let item = StoredItem {
            key: key.to_string(),
            value: value.to_string(),
        };
        let content = serde_json::to_string(&item)
            .map_err(|e| MediumError::Unavailable(format!("item not encodable: {e}")))?;

        // Write-then-rename so readers never observe a half-written item.
        let path = self.item_path(key);
        let tmp = path.with_extension(TEMP_EXTENSION);
        let written = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool, MediumError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            // Foreign or damaged files in the directory are not ours to list.
            if let Ok(item) = serde_json::from_str::<StoredItem>(&content) {
                let stem = path.file_stem().and_then(|stem| stem.to_str());
                if stem == Some(file_stem(&item.key).as_str()) {
                    keys.push(item.key);
                }
            }
        }
        Ok(keys)
    }
}

fn file_stem(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_medium() -> (FileMedium, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let medium = FileMedium::with_dir(temp_dir.path());
        (medium, temp_dir)
    }

    fn file_names(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_file_stem_is_fixed_length() {
        assert_eq!(file_stem("a:1").len(), 64);
        assert_eq!(file_stem(&"k".repeat(4096)).len(), 64);
        assert_ne!(file_stem("a:1"), file_stem("a:2"));
    }

    #[test]
    fn test_set_creates_file() {
        let (medium, temp_dir) = create_test_medium();

        medium.set_item("insightcore:camera/1", "{}").unwrap();

        let expected = temp_dir
            .path()
            .join(format!("{}.json", file_stem("insightcore:camera/1")));
        assert!(expected.exists());
    }

    #[test]
    fn test_long_key_roundtrip() {
        let (medium, _temp_dir) = create_test_medium();
        let key = format!("insightcore:{}", "x".repeat(500));

        medium.set_item(&key, "v").unwrap();

        assert_eq!(medium.get_item(&key).unwrap(), Some("v".to_string()));
        assert_eq!(medium.keys().unwrap(), vec![key.clone()]);
        assert!(medium.remove_item(&key).unwrap());
    }

    #[test]
    fn test_get_missing_is_none() {
        let (medium, _temp_dir) = create_test_medium();
        assert_eq!(medium.get_item("nope").unwrap(), None);
    }

    #[test]
    fn test_get_damaged_file_returns_raw_content() {
        let (medium, _temp_dir) = create_test_medium();
        fs::write(medium.item_path("k"), "{\"key\": trunc").unwrap();

        assert_eq!(
            medium.get_item("k").unwrap(),
            Some("{\"key\": trunc".to_string())
        );
    }

    #[test]
    fn test_survives_new_handle() {
        let (medium, temp_dir) = create_test_medium();
        medium.set_item("k", "persisted").unwrap();

        let reopened = FileMedium::with_dir(temp_dir.path());

        assert_eq!(reopened.get_item("k").unwrap(), Some("persisted".to_string()));
    }

    #[test]
    fn test_remove_reports_presence() {
        let (medium, _temp_dir) = create_test_medium();
        medium.set_item("k", "v").unwrap();

        assert!(medium.remove_item("k").unwrap());
        assert!(!medium.remove_item("k").unwrap());
    }

    #[test]
    fn test_keys_skips_foreign_files() {
        let (medium, temp_dir) = create_test_medium();
        medium.set_item("a:1", "x").unwrap();
        medium.set_item("b:2", "y").unwrap();
        fs::write(temp_dir.path().join("README.txt"), "hi").unwrap();
        fs::write(temp_dir.path().join("not-ours.json"), "{}").unwrap();
        fs::write(
            temp_dir.path().join("renamed.json"),
            r#"{"key":"c:3","value":"z"}"#,
        )
        .unwrap();

        let mut keys = medium.keys().unwrap();
        keys.sort();

        assert_eq!(keys, vec!["a:1".to_string(), "b:2".to_string()]);
    }

    #[test]
    fn test_keys_of_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::with_dir(temp_dir.path().join("never-created"));

        assert!(medium.keys().unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let (medium, temp_dir) = create_test_medium();
        // A directory in the item's place makes the final rename fail.
        fs::create_dir_all(medium.item_path("k").join("blocker")).unwrap();

        assert!(medium.set_item("k", "v").is_err());

        let names = file_names(temp_dir.path());
        assert!(!names.iter().any(|name| name.ends_with(".tmp")));
    }

    #[test]
    fn test_for_app_path_contains_name() {
        if let Some(medium) = FileMedium::for_app("insightcore") {
            assert!(medium.dir().to_string_lossy().contains("insightcore"));
        }
        // No home directory (e.g. CI sandbox) is fine too.
    }
}
