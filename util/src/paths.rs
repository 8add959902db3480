use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Upload storage root (absolute), from `config::upload_storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::upload_storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Folder holding visit photos for every ticket: {STORAGE_ROOT}/tickets
pub fn ticket_photos_dir() -> PathBuf {
    storage_root().join("tickets")
}

/// Reduce an uploaded filename to a safe basename.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Leading dots are stripped so the result can never be `..` or a hidden file.
/// An empty result becomes `"upload"`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored name for a ticket photo: "{ticket_id}_{sanitized}".
pub fn ticket_photo_filename(ticket_id: i64, raw: &str) -> String {
    format!("{ticket_id}_{}", sanitize_filename(raw))
}

/// Full path to a stored ticket photo. `stored_name` must come from
/// [`ticket_photo_filename`]; it is sanitized again before joining.
pub fn ticket_photo_path(stored_name: &str) -> PathBuf {
    ticket_photos_dir().join(sanitize_filename(stored_name))
}

/// Where an upload waits until the ticket update that references it commits.
pub fn ticket_photo_staging_path(stored_name: &str) -> PathBuf {
    ticket_photos_dir().join(format!("{}.part", sanitize_filename(stored_name)))
}
