use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;
use hippoforge_contracts::ProjectProfile;
use tracing::{info, warn};

const LEGACY_FILENAME: &str = "swarm_state.json";
const CURRENT_FILENAME: &str = "blackboard.json";
const LOCK_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// The authoritative-on-disk backend: a single JSON file per project
/// root, guarded by an advisory file lock (§4.1, §5). File errors are
/// fatal, unlike the SQL backend's best-effort failures.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn state_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILENAME)
    }

    fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_FILENAME)
    }

    /// Detects a legacy state file name and renames it with a timestamp
    /// suffix before first load, per §4.1's migration routine.
    pub fn migrate_legacy_filename(&self) -> Result<()> {
        let legacy = self.legacy_path();
        if legacy.exists() && !self.state_path().exists() {
            let suffix = Utc::now().format("%Y%m%dT%H%M%SZ");
            let backup = self.root.join(format!("{LEGACY_FILENAME}.{suffix}.bak"));
            fs::rename(&legacy, &backup)
                .with_context(|| format!("failed to archive legacy state file {legacy:?}"))?;
            info!(from = ?legacy, to = ?backup, "migrated legacy blackboard filename");
        }
        Ok(())
    }

    pub fn load(&self) -> Result<Option<ProjectProfile>> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        let _lock = acquire_shared_lock(&path)?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read blackboard file {path:?}"))?;
        let profile: ProjectProfile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse blackboard file {path:?}"))?;
        Ok(Some(profile))
    }

    pub fn save(&self, profile: &ProjectProfile) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.state_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to open blackboard file {path:?}"))?;
        acquire_exclusive_lock(&file)?;
        let body = serde_json::to_vec_pretty(profile)?;
        use std::io::Write;
        (&file).write_all(&body)?;
        fs2::FileExt::unlock(&file).ok();
        Ok(())
    }
}

fn acquire_exclusive_lock(file: &File) -> Result<()> {
    let start = Instant::now();
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(_) if start.elapsed() < LOCK_ACQUIRE_TIMEOUT => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                warn!("failed to acquire exclusive file lock within {LOCK_ACQUIRE_TIMEOUT:?}");
                return Err(anyhow::anyhow!("file lock acquisition timed out: {e}"));
            }
        }
    }
}

fn acquire_shared_lock(path: &Path) -> Result<File> {
    let file = File::open(path)?;
    let start = Instant::now();
    loop {
        match file.try_lock_shared() {
            Ok(()) => return Ok(file),
            Err(_) if start.elapsed() < LOCK_ACQUIRE_TIMEOUT => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(anyhow::anyhow!("file lock acquisition timed out: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir();
        let backend = FileBackend::new(dir.clone());
        let profile = ProjectProfile::fresh("claude-sonnet");
        backend.save(&profile).unwrap();
        let loaded = backend.load().unwrap().expect("profile should load");
        assert_eq!(loaded.schema_version, profile.schema_version);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn legacy_filename_is_migrated_with_timestamp_suffix() {
        let dir = tempdir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LEGACY_FILENAME), "{}").unwrap();
        let backend = FileBackend::new(dir.clone());
        backend.migrate_legacy_filename().unwrap();
        assert!(!dir.join(LEGACY_FILENAME).exists());
        let migrated = fs::read_dir(&dir)
            .unwrap()
            .any(|entry| entry.unwrap().file_name().to_string_lossy().contains(".bak"));
        assert!(migrated);
        fs::remove_dir_all(dir).ok();
    }

    fn tempdir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hippoforge-blackboard-test-{}-{nanos}",
            std::process::id()
        ));
        path
    }
}
