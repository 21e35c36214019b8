//! Bounded history of diagnostic reports.
//!
//! Kept in memory and, when a path is configured, mirrored to a JSON file
//! so the last report survives a restart. A broken or missing file never
//! stops diagnostics; it is logged and the history starts empty.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::self_repair::DiagnosticReport;

/// Maximum number of reports retained.
pub const MAX_ENTRIES: usize = 50;

#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: RwLock<VecDeque<DiagnosticReport>>,
    path: Option<PathBuf>,
    /// Held from snapshot to rename so the file never goes backwards.
    write_lock: Mutex<()>,
}

impl DiagnosticLog {
    /// In-memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror to `path`, loading whatever it already holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<VecDeque<DiagnosticReport>>(&text) {
                Ok(mut entries) => {
                    while entries.len() > MAX_ENTRIES {
                        entries.pop_front();
                    }
                    entries
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable diagnostic log {}: {}", path.display(), e);
                    VecDeque::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => {
                log::warn!("Could not read diagnostic log {}: {}", path.display(), e);
                VecDeque::new()
            }
        };
        Self {
            entries: RwLock::new(entries),
            path: Some(path),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `report`, dropping the oldest entry past [`MAX_ENTRIES`].
    pub async fn record(&self, report: DiagnosticReport) {
        let _guard = self.write_lock.lock().await;
        let snapshot = {
            let mut entries = self.entries.write();
            entries.push_back(report);
            while entries.len() > MAX_ENTRIES {
                entries.pop_front();
            }
            self.path.as_ref().map(|_| entries.clone())
        };

        if let (Some(path), Some(snapshot)) = (&self.path, snapshot) {
            if let Err(e) = persist(path, &snapshot).await {
                log::warn!("Could not write diagnostic log {}: {}", path.display(), e);
            }
        }
    }

    /// Most recent report, if any.
    pub fn last(&self) -> Option<DiagnosticReport> {
        self.entries.read().back().cloned()
    }

    /// All retained reports, oldest first.
    pub fn entries(&self) -> Vec<DiagnosticReport> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

async fn persist(path: &Path, entries: &VecDeque<DiagnosticReport>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let body = serde_json::to_vec_pretty(entries)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "selfrepair-log.json".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await
}
