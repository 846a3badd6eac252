use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::document::model::Document;
use crate::document::store::DocumentStore;
use crate::foundation::core::SessionId;
use crate::foundation::error::{CadenzaError, CadenzaResult};

const SCRATCH_DIR_PREFIX: &str = "session-";

/// One isolated scratch working context, exclusively owned by the job that
/// created it.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    scratch: Document,
    scratch_dir: Option<PathBuf>,
    created_at: Instant,
}

impl Session {
    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The scratch document the engine builds into.
    pub fn scratch(&self) -> &Document {
        &self.scratch
    }

    /// On-disk scratch directory, when a scratch root is configured.
    pub fn scratch_dir(&self) -> Option<&std::path::Path> {
        self.scratch_dir.as_deref()
    }

    /// How long the session has existed.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Creates and destroys per-job scratch sessions, and owns the
/// preserve/restore discipline that keeps background generation from ever
/// perturbing the user's shared document.
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    scratch_root: Option<PathBuf>,
    sessions: HashMap<SessionId, Session>,
    next_id: u64,
}

impl SessionManager {
    /// Manager over the given persistence collaborator, with no on-disk
    /// scratch.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            scratch_root: None,
            sessions: HashMap::new(),
            next_id: 0,
        }
    }

    /// Give each session an on-disk scratch directory under `root`.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Remove scratch directories orphaned by abnormal termination.
    /// Best-effort only: failures are logged and skipped.
    pub fn sweep_orphans(&self) -> usize {
        let Some(root) = &self.scratch_root else {
            return 0;
        };
        let Ok(entries) = std::fs::read_dir(root) else {
            return 0;
        };
        let mut swept = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(SCRATCH_DIR_PREFIX) {
                continue;
            }
            match std::fs::remove_dir_all(entry.path()) {
                Ok(()) => swept += 1,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "orphan sweep skip");
                }
            }
        }
        if swept > 0 {
            tracing::debug!(swept, "swept orphaned scratch sessions");
        }
        swept
    }

    /// Allocate an empty, isolated scratch working context, distinct from
    /// the shared document.
    pub fn create_session(&mut self) -> CadenzaResult<SessionId> {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let scratch_dir = match &self.scratch_root {
            Some(root) => {
                let dir = root.join(format!("{SCRATCH_DIR_PREFIX}{}", id.0));
                std::fs::create_dir_all(&dir).map_err(|e| {
                    CadenzaError::session(format!("create scratch dir {}: {e}", dir.display()))
                })?;
                Some(dir)
            }
            None => None,
        };

        self.sessions.insert(
            id,
            Session {
                id,
                scratch: Document::empty(),
                scratch_dir,
                created_at: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Look up a live session.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Mutable access to a session's scratch document.
    pub fn scratch_mut(&mut self, id: SessionId) -> Option<&mut Document> {
        self.sessions.get_mut(&id).map(|s| &mut s.scratch)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Release a session. Idempotent: destroying an already-destroyed id is
    /// a no-op and touches no other session.
    pub fn destroy_session(&mut self, id: SessionId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        if let Some(dir) = session.scratch_dir
            && let Err(e) = std::fs::remove_dir_all(&dir)
        {
            tracing::warn!(path = %dir.display(), error = %e, "scratch dir removal failed");
        }
    }

    /// Release every live session.
    pub fn destroy_all(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        for id in ids {
            self.destroy_session(id);
        }
    }

    /// Snapshot the shared document immediately before an isolated
    /// generation call.
    ///
    /// The returned guard restores the snapshot unconditionally, explicitly
    /// via [`SharedStateGuard::restore`] on ordinary paths or on drop for
    /// error and panic paths, so no exit from a generation call can leave
    /// the user's in-progress work perturbed.
    pub fn preserve_shared_state(&self) -> CadenzaResult<SharedStateGuard> {
        let snapshot = self.store.load_shared()?;
        Ok(SharedStateGuard {
            store: Arc::clone(&self.store),
            snapshot: Some(snapshot),
        })
    }
}

/// Scoped checkout of the shared document around one generation call.
pub struct SharedStateGuard {
    store: Arc<dyn DocumentStore>,
    snapshot: Option<Document>,
}

impl SharedStateGuard {
    /// Restore the snapshot now and surface any unrecoverable store error.
    ///
    /// A failed restore falls back to writing the known-good empty default
    /// before erroring, so the shared resource is never left in a torn
    /// state.
    pub fn restore(mut self) -> CadenzaResult<()> {
        self.restore_now()
    }

    fn restore_now(&mut self) -> CadenzaResult<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Ok(());
        };
        match self.store.save_shared(&snapshot) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "shared document restore failed; writing empty default");
                self.store.save_shared(&Document::empty()).map_err(|e2| {
                    CadenzaError::document(format!(
                        "restore failed ({e}) and empty-default fallback failed ({e2})"
                    ))
                })
            }
        }
    }
}

impl Drop for SharedStateGuard {
    fn drop(&mut self) {
        if self.snapshot.is_some()
            && let Err(e) = self.restore_now()
        {
            tracing::warn!(error = %e, "shared document restore failed during unwind");
        }
    }
}
