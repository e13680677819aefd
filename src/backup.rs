//! Timestamped snapshots of the site configuration.
//!
//! Every mutation copies the document byte-for-byte into
//! `<stem>.<timestamp>.backup.js` before anything is rewritten. Backups are
//! never pruned.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{MutatorError, MutatorResult};

/// A backup written by [`backup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHandle {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// RFC 3339 UTC timestamp with milliseconds, with `:` and `.` replaced so it
/// is safe inside a file name.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Snapshot `document` (whose current content is `content`) into `dir`.
///
/// Names that already exist get a `-1`, `-2`, ... suffix on the timestamp;
/// files are opened with create-new semantics so two backups never share a
/// file.
pub fn backup(document: &Path, content: &str, dir: &Path) -> MutatorResult<BackupHandle> {
    let created_at = Utc::now();
    let stamp = file_timestamp(created_at);
    let stem = document_stem(document);

    std::fs::create_dir_all(dir).map_err(|e| MutatorError::io(dir, e))?;

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.{}.backup.js", stem, stamp)
        } else {
            format!("{}.{}-{}.backup.js", stem, stamp, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())
                    .and_then(|_| file.sync_all())
                    .map_err(|e| MutatorError::io(&path, e))?;
                return Ok(BackupHandle { path, created_at });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(MutatorError::io(&path, e)),
        }
    }
}

/// `docusaurus.config.js` → `docusaurus.config`.
fn document_stem(document: &Path) -> String {
    let name = document
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    match name.strip_suffix(".js") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}
