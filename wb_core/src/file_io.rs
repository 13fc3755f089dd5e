//! # Library Files
//!
//! Persistence for [`ProfileLibrary`] and export documents.
//!
//! - Libraries are JSON in `.wbl` files, written atomically (temp file, fsync,
//!   rename) and schema-checked on load.
//! - A library being edited is guarded by a [`FileLock`]: an OS lock via fs2
//!   plus a `.wbl.lock` sidecar naming the holder.
//! - Export documents go through the same atomic write.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wb_core::file_io::{load_library, save_library, FileLock};
//! use wb_core::templates::AircraftTemplate;
//!
//! let path = Path::new("hangar.wbl");
//! let _lock = FileLock::acquire(path, "ops@example.com")?;
//!
//! let mut library = load_library(path)?;
//! library.add_profile(AircraftTemplate::PiperPa28.to_profile());
//! save_library(&library, path)?;
//! # Ok::<(), wb_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::export::ExportDocument;
use crate::profile::{ProfileLibrary, SCHEMA_VERSION};

/// Extension for profile library files
pub const LIBRARY_EXTENSION: &str = "wbl";

/// Locks older than this are taken over regardless of their holder
const LOCK_MAX_AGE_HOURS: i64 = 24;

/// Contents of a `.lock` sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: machine_name(),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// True when the holder is gone or the lock has outlived
    /// [`LOCK_MAX_AGE_HOURS`].
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > Duration::hours(LOCK_MAX_AGE_HOURS) {
            return true;
        }
        self.machine == machine_name() && !process_alive(self.pid)
    }

    fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }
}

fn machine_name() -> String {
    let var = if cfg!(windows) { "COMPUTERNAME" } else { "HOSTNAME" };
    std::env::var(var)
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No cheap liveness check here, so only the age check applies
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive edit lock on a library file. Released on drop.
pub struct FileLock {
    library_path: PathBuf,
    lock_path: PathBuf,
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Take the lock for `user_id`.
    ///
    /// Fails with [`CalcError::FileLocked`] when a live lock is held by
    /// someone else; a stale sidecar is overwritten.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !existing.is_stale() {
                return Err(CalcError::file_locked(
                    path.display().to_string(),
                    existing.holder(),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            tracing::debug!(path = %lock_path.display(), holder = %existing.holder(), "taking over stale lock");
        }

        // Holder's sidecar stays intact until the OS lock is ours
        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        handle
            .try_lock_exclusive()
            .map_err(|_| CalcError::file_locked(path.display().to_string(), "another process", "unknown"))?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(CalcError::serialization)?;
        handle
            .set_len(0)
            .and_then(|_| handle.write_all(json.as_bytes()))
            .and_then(|_| handle.sync_all())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        Ok(FileLock {
            library_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `hangar.wbl` -> `hangar.wbl.lock`
fn lock_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "lock")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Write `contents` to `path` through a `.tmp` sibling, fsync, then rename.
fn write_atomic(path: &Path, contents: &str) -> CalcResult<()> {
    let tmp_path = sibling_with_suffix(path, "tmp");

    let mut tmp = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
        })?;
    drop(tmp);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Save a library atomically.
pub fn save_library(library: &ProfileLibrary, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(library).map_err(CalcError::serialization)?;
    write_atomic(path, &json)?;
    tracing::debug!(
        path = %path.display(),
        profiles = library.profiles.len(),
        calculations = library.calculations.len(),
        "library saved"
    );
    Ok(())
}

/// Load a library, rejecting files from an incompatible schema.
pub fn load_library(path: &Path) -> CalcResult<ProfileLibrary> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let library: ProfileLibrary = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid library file {}: {}", path.display(), e)))?;

    validate_version(&library.meta.version)?;
    tracing::debug!(path = %path.display(), version = %library.meta.version, "library loaded");
    Ok(library)
}

/// Load a library together with the live lock on it, if someone holds one.
pub fn load_library_with_lock_check(path: &Path) -> CalcResult<(ProfileLibrary, Option<LockInfo>)> {
    let library = load_library(path)?;
    Ok((library, FileLock::check(path)))
}

/// Write an export document into `dir` under its suggested file name.
pub fn write_export(document: &ExportDocument, dir: &Path) -> CalcResult<PathBuf> {
    let path = dir.join(document.file_name());
    write_atomic(&path, &document.to_json_pretty()?)?;
    tracing::debug!(path = %path.display(), "export written");
    Ok(path)
}

/// Major versions must match; under 0.x a newer minor is also rejected.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Option<(u32, u32)> {
        let mut parts = v.split('.').map(str::parse::<u32>);
        let major = parts.next()?.ok()?;
        let minor = parts.next().and_then(Result::ok).unwrap_or(0);
        Some((major, minor))
    };

    let (file_major, file_minor) = parse(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    use crate::profile::Calculation;
    use crate::templates::AircraftTemplate;

    fn temp_library_path(name: &str) -> PathBuf {
        temp_dir().join(format!("wb_core_test_{}_{}.{}", name, std::process::id(), LIBRARY_EXTENSION))
    }

    #[test]
    fn test_sidecar_paths() {
        let path = Path::new("/data/hangar.wbl");
        assert_eq!(lock_path_for(path), Path::new("/data/hangar.wbl.lock"));
        assert_eq!(sibling_with_suffix(path, "tmp"), Path::new("/data/hangar.wbl.tmp"));
    }

    #[test]
    fn test_save_and_load_library() {
        let path = temp_library_path("roundtrip");

        let mut library = ProfileLibrary::new();
        let id = library.add_profile(AircraftTemplate::Cessna172N.to_profile());
        let calc = Calculation::from_profile("Local flight", id, library.get_profile(&id).unwrap());
        library.add_calculation(calc).unwrap();
        save_library(&library, &path).unwrap();

        assert!(!sibling_with_suffix(&path, "tmp").exists());

        let (loaded, lock) = load_library_with_lock_check(&path).unwrap();
        assert!(lock.is_none());
        assert_eq!(loaded.stats(), library.stats());
        assert_eq!(loaded.get_profile(&id), library.get_profile(&id));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let path = temp_library_path("newer_schema");
        let mut library = ProfileLibrary::new();
        library.meta.version = "0.9.0".to_string();
        save_library(&library, &path).unwrap();

        let err = load_library(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_and_corrupt_files() {
        let missing = temp_library_path("missing");
        assert_eq!(load_library(&missing).unwrap_err().error_code(), "FILE_ERROR");

        let corrupt = temp_library_path("corrupt");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(load_library(&corrupt).unwrap_err().error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&corrupt);
    }

    #[test]
    fn test_lock_blocks_second_holder() {
        let path = temp_library_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "first@example.com").unwrap();
        assert!(lock_path_for(&path).exists());
        assert_eq!(FileLock::check(&path).unwrap().user_id, "first@example.com");

        let err = FileLock::acquire(&path, "second@example.com").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");

        drop(lock);
        assert!(!lock_path_for(&path).exists());
        assert!(FileLock::check(&path).is_none());

        let _ = fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_sidecar_under_live_lock_is_left_alone() {
        let path = temp_library_path("stale_sidecar");
        File::create(&path).unwrap();
        let lock_path = lock_path_for(&path);

        let lock = FileLock::acquire(&path, "first@example.com").unwrap();

        // Sidecar looks abandoned but the OS lock is still held
        let mut old = LockInfo::new("first@example.com");
        old.locked_at = Utc::now() - Duration::hours(LOCK_MAX_AGE_HOURS + 1);
        fs::write(&lock_path, serde_json::to_string_pretty(&old).unwrap()).unwrap();

        let err = FileLock::acquire(&path, "second@example.com").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");

        let info = read_lock_info(&lock_path).unwrap();
        assert_eq!(info.user_id, "first@example.com");
        assert_eq!(info.locked_at, old.locked_at);

        drop(lock);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("someone");
        assert!(!info.is_stale());
        info.locked_at = Utc::now() - Duration::hours(LOCK_MAX_AGE_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.3").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_write_export() {
        let dir = temp_dir();
        let doc = ExportDocument::from_profile(&AircraftTemplate::PiperPa28.to_profile());
        let path = write_export(&doc, &dir).unwrap();

        assert!(path.file_name().unwrap().to_string_lossy().starts_with("weight-balance-Piper-PA-28-"));
        let back: ExportDocument = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, doc);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_write_export_stays_in_dir() {
        let dir = temp_dir();
        let mut doc = ExportDocument::from_profile(&AircraftTemplate::PiperPa28.to_profile());
        doc.profile_name = format!("../ferry/N{}", std::process::id());
        let path = write_export(&doc, &dir).unwrap();

        assert_eq!(path.parent(), Some(dir.as_path()));
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }
}
