use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::session::MasteryMap;
use crate::session::mistakes::MistakeLog;
use crate::session::result::ExamResult;
use crate::store::schema::{
    CREDENTIAL_KEY, EXPORT_VERSION, ExportData, HISTORY_KEY, MASTERY_KEY, MISTAKES_KEY,
    PROGRESS_KEYS,
};

/// Best-effort key/value persistence: one pretty-printed JSON file per key.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = Self::default_dir();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("knm-trainer")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Value stored under `key`, or `default` when it is missing, empty or
    /// unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.file_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return default,
        };
        if content.trim().is_empty() {
            return default;
        }
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
                default
            }
        }
    }

    /// Store `value` under `key`. Failures are logged and dropped.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.write_atomic(key, value) {
            log::warn!("failed to save {key}: {e:#}");
        }
    }

    fn write_atomic<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(value)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_mistakes(&self) -> MistakeLog {
        self.load(MISTAKES_KEY, MistakeLog::new())
    }

    pub fn save_mistakes(&self, log: &MistakeLog) {
        self.save(MISTAKES_KEY, log)
    }

    pub fn load_history(&self) -> Vec<ExamResult> {
        self.load(HISTORY_KEY, Vec::new())
    }

    pub fn save_history(&self, history: &[ExamResult]) {
        self.save(HISTORY_KEY, &history)
    }

    pub fn load_mastery(&self) -> MasteryMap {
        self.load(MASTERY_KEY, MasteryMap::new())
    }

    pub fn save_mastery(&self, mastery: &MasteryMap) {
        self.save(MASTERY_KEY, mastery)
    }

    pub fn load_credential(&self) -> Option<String> {
        self.load::<Option<String>>(CREDENTIAL_KEY, None)
            .filter(|key| !key.trim().is_empty())
    }

    pub fn save_credential(&self, credential: &str) {
        self.save(CREDENTIAL_KEY, &credential.trim())
    }

    pub fn clear_credential(&self) {
        let path = self.file_path(CREDENTIAL_KEY);
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            log::warn!("failed to remove stored credential: {e}");
        }
    }

    pub fn export_all(&self) -> ExportData {
        ExportData {
            knm_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            mistakes: self.load_mistakes(),
            history: self.load_history(),
            mastery: self.load_mastery(),
        }
    }

    /// Replace all progress files with `data`.
    ///
    /// Every file is first written to `.tmp`; only when all are staged are the
    /// originals moved to `.bak` and the staged files renamed into place. Any
    /// failure restores what was there before.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.knm_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.knm_export_version,
                EXPORT_VERSION
            );
        }

        let files: [(&str, String); 3] = [
            (MISTAKES_KEY, serde_json::to_string_pretty(&data.mistakes)?),
            (HISTORY_KEY, serde_json::to_string_pretty(&data.history)?),
            (MASTERY_KEY, serde_json::to_string_pretty(&data.mastery)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (key, json) in &files {
            let tmp_path = self.file_path(key).with_extension("json.tmp");
            let written = (|| -> Result<()> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })();
            match written {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    remove_all(&staged);
                    bail!("Import failed during staging: {e}");
                }
            }
        }

        // (final path, backup path, had an original)
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (key, _)) in files.iter().enumerate() {
            let final_path = self.file_path(key);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                remove_all(&staged);
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(&staged[i], &final_path) {
                if had_original {
                    let _ = fs::rename(&bak_path, &final_path);
                }
                rollback(&committed);
                remove_all(&staged[i..]);
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        log::info!(
            "imported {} mistakes, {} exams",
            data.mistakes.len(),
            data.history.len()
        );
        Ok(())
    }

    /// Remove `.bak` files left by an interrupted import. Returns true if any
    /// were found.
    pub fn check_interrupted_import(&self) -> bool {
        let mut found = false;
        for key in PROGRESS_KEYS {
            let bak_path = self.file_path(key).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }
}

fn rollback(committed: &[(PathBuf, PathBuf, bool)]) {
    for (final_path, bak_path, had_original) in committed {
        if *had_original {
            let _ = fs::rename(bak_path, final_path);
        } else {
            let _ = fs::remove_file(final_path);
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mistakes::record_incorrect;
    use crate::session::question::sample;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn sample_log() -> MistakeLog {
        let mut log = MistakeLog::new();
        let now = Utc::now();
        record_incorrect(&mut log, &sample("b", 1), now);
        record_incorrect(&mut log, &sample("a", 0), now);
        record_incorrect(&mut log, &sample("a", 0), now);
        log
    }

    #[test]
    fn test_mistake_log_round_trip() {
        let (_dir, store) = make_test_store();
        let log = sample_log();
        store.save_mistakes(&log);

        let loaded = store.load_mistakes();
        assert_eq!(loaded, log);
        let keys: Vec<&String> = loaded.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_empty_and_corrupt_fall_back_to_default() {
        let (_dir, store) = make_test_store();
        assert!(store.load_history().is_empty());

        fs::write(store.file_path(HISTORY_KEY), "").unwrap();
        assert!(store.load_history().is_empty());

        fs::write(store.file_path(MASTERY_KEY), "{not json").unwrap();
        assert!(store.load_mastery().is_empty());
        assert_eq!(store.load("knm_other", 7u32), 7);
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let (dir, store) = make_test_store();
        let bad_store = JsonStore {
            base_dir: dir.path().join("missing"),
        };
        bad_store.save_mistakes(&sample_log());
        assert!(bad_store.load_mistakes().is_empty());
        assert!(store.load_mistakes().is_empty());
    }

    #[test]
    fn test_credential_lifecycle() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.load_credential(), None);

        store.save_credential("  abc123 ");
        assert_eq!(store.load_credential().as_deref(), Some("abc123"));

        store.clear_credential();
        assert_eq!(store.load_credential(), None);
        assert!(!store.file_path(CREDENTIAL_KEY).exists());
    }

    #[test]
    fn test_round_trip_export_import() {
        let (_dir, store) = make_test_store();
        store.save_mistakes(&sample_log());
        let mut mastery = MasteryMap::new();
        mastery.insert("p4gMdOqgeQQ".to_string(), true);
        store.save_mastery(&mastery);

        let export = store.export_all();
        assert_eq!(export.knm_export_version, EXPORT_VERSION);

        let (_dir2, store2) = make_test_store();
        store2.import_all(&export).unwrap();
        assert_eq!(store2.load_mistakes(), export.mistakes);
        assert_eq!(store2.load_mastery(), mastery);
        assert!(store2.load_history().is_empty());
    }

    #[test]
    fn test_version_rejection() {
        let (_dir, store) = make_test_store();
        let mut export = store.export_all();
        export.knm_export_version = 99;

        let err_msg = store.import_all(&export).unwrap_err().to_string();
        assert!(err_msg.contains("Unsupported export version"));
        assert!(err_msg.contains("99"));
    }

    #[test]
    fn test_import_staging_failure_preserves_originals() {
        let (dir, store) = make_test_store();
        store.save_mistakes(&sample_log());
        let original = fs::read_to_string(store.file_path(MISTAKES_KEY)).unwrap();

        let bad_store = JsonStore {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        let result = bad_store.import_all(&store.export_all());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Import failed during staging")
        );

        let after = fs::read_to_string(store.file_path(MISTAKES_KEY)).unwrap();
        assert_eq!(original, after);
        let tmp_files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(tmp_files, 0, "no residual .tmp files");
    }

    #[test]
    fn test_check_interrupted_import_detects_bak_files() {
        let (_dir, store) = make_test_store();
        assert!(!store.check_interrupted_import());

        let bak = store.file_path(HISTORY_KEY).with_extension("json.bak");
        fs::write(&bak, "[]").unwrap();
        assert!(store.check_interrupted_import());
        assert!(!bak.exists());
    }
}
