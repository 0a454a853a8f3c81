use crate::error::StoreError;
use crate::utils::{extension_for, sanitize_segment};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use url::Url;

/// Data a snapshot filename is derived from
#[derive(Debug, Clone)]
pub struct NamingKey<'a> {
    /// Link the snapshot was captured from
    pub link: &'a str,
    /// Declared content type of the snapshot
    pub content_type: &'a str,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Index of the job within its batch, unique per batch
    pub seq: usize,
}

/// Build the snapshot filename for a job.
///
/// Shape is `<timestamp>-<domain>-<basename>-<seq><ext>`; domain and basename
/// are dropped when the link has no usable host or path. The sequence index is
/// always present so two jobs of one batch never share a name.
pub fn file_name(key: &NamingKey<'_>) -> String {
    let now = key.captured_at.format("%Y-%m-%d-%H%M%S");
    let ext = extension_for(key.content_type);
    let seq = key.seq;

    let url = match Url::parse(key.link) {
        Ok(url) => url,
        Err(_) => return format!("{now}-{seq}{ext}"),
    };
    let domain = match url.host_str() {
        Some(host) if !host.is_empty() => sanitize_segment(&host.replace('.', "-")),
        _ => return format!("{now}-{seq}{ext}"),
    };

    let base = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()));

    match base {
        None => format!("{now}-{domain}-{seq}{ext}"),
        Some(base) => {
            // Long slugs are cut to their first four words
            let base: Vec<&str> = base.split('-').take(4).collect();
            let base = sanitize_segment(&base.join("-"));
            format!("{now}-{domain}-{base}-{seq}{ext}")
        }
    }
}

/// Writes snapshots into the batch-scoped temp directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` under a name derived from `key` and return its path
    pub async fn store(&self, key: &NamingKey<'_>, content: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(file_name(key));
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StoreError::WriteError {
                path: path.clone(),
                source,
            })?;

        ::log::debug!("Stored {} bytes at {}", content.len(), path.display());
        Ok(path)
    }
}
