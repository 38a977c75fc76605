use std::path::{Path, PathBuf};

/// Cross-instance change broadcast: a well-known file holding the
/// millisecond timestamp of the last local mutation.
///
/// Every instance of the app on this machine shares the path. Writers
/// call [`touch`](Self::touch) after a confirmed mutation; every other
/// instance notices the content change on its next poll and performs a
/// full refresh. Trigger-only — no state is diffed or merged through the
/// file, so redundant triggers are harmless.
#[derive(Debug)]
pub struct SyncMarker {
    path: PathBuf,
    last_written: Option<String>,
    last_seen: Option<String>,
}

impl SyncMarker {
    /// Adopts the file's current content (if any) as already-seen, so a
    /// marker left over from an earlier run does not fire a refresh at
    /// startup.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_seen = std::fs::read_to_string(&path).ok();
        Self {
            path,
            last_written: None,
            last_seen,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that this instance just mutated server state. Own writes
    /// are remembered and never echoed back by `poll_foreign_change`.
    pub fn touch(&mut self) {
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(&self.path, &stamp) {
            Ok(()) => {
                self.last_written = Some(stamp.clone());
                self.last_seen = Some(stamp);
            }
            Err(e) => {
                tracing::warn!("sync marker write failed at {}: {e}", self.path.display());
            }
        }
    }

    /// True when another instance wrote the marker since the last poll.
    pub fn poll_foreign_change(&mut self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return false;
        };
        if self.last_seen.as_deref() == Some(content.as_str()) {
            return false;
        }
        let foreign = self.last_written.as_deref() != Some(content.as_str());
        self.last_seen = Some(content);
        foreign
    }
}
