//! File-backed session slot.
//!
//! Each key is stored as its own JSON file inside the session directory.
//! The directory is expected to live somewhere that is cleared when the
//! user's login session ends (the platform runtime directory by default).

use advisor_core::auth::SessionSlot;
use advisor_core::{AdvisorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct SlotEntry {
    value: String,
    written_at: DateTime<Utc>,
}

/// Session slot persisting one file per key.
///
/// # Security Note
///
/// Slot files hold bearer credentials. On Unix the directory is created with
/// mode 700 and must belong to the current user, and slot files are created
/// with mode 600 before any byte is written.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AdvisorError::internal(format!(
                "invalid session slot key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SessionSlot for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let entry: SlotEntry = serde_json::from_str(&content)?;
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        let entry = SlotEntry {
            value: value.to_string(),
            written_at: Utc::now(),
        };
        let json = serde_json::to_vec(&entry)?;
        ensure_private_dir(&self.dir)?;
        write_private(&path, &json)?;

        tracing::debug!("[SessionSlot] Wrote slot '{}' in {:?}", key, self.dir);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| AdvisorError::internal(format!("slot path has no file name: {:?}", path)))?;
    Ok(path.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}

fn permission_denied(message: String) -> AdvisorError {
    std::io::Error::new(std::io::ErrorKind::PermissionDenied, message).into()
}

/// Creates the session directory with mode 700, or checks an existing one.
///
/// # Errors
///
/// Refuses a symlink, a non-directory, or a directory owned by another user.
#[cfg(unix)]
fn ensure_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::{DirBuilderExt, MetadataExt, PermissionsExt};

    match fs::symlink_metadata(dir) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
        }
        Err(e) => return Err(e.into()),
    }

    // Checked after creation too: someone may have won the race.
    let meta = fs::symlink_metadata(dir)?;
    if !meta.file_type().is_dir() {
        return Err(permission_denied(format!(
            "session directory {:?} is not a plain directory",
            dir
        )));
    }
    if meta.uid() != rustix::process::geteuid().as_raw() {
        return Err(permission_denied(format!(
            "session directory {:?} is owned by another user",
            dir
        )));
    }
    if meta.mode() & 0o077 != 0 {
        tracing::warn!("[SessionSlot] Restricting permissions of {:?} to 700", dir);
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Writes `bytes` to `path` through a sibling temp file created exclusively
/// with mode 600, then renames it into place.
///
/// # Errors
///
/// Refuses to write through a symlink left at the temp path.
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp_path = temp_path(path)?;
    match fs::symlink_metadata(&tmp_path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(permission_denied(format!(
                "refusing to write slot through symlink {:?}",
                tmp_path
            )));
        }
        // Leftover from an interrupted write.
        Ok(_) => fs::remove_file(&tmp_path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp_path)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
