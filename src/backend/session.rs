//! Signed-in session: the bearer token and who is watching it
//!
//! The token is persisted to a single file so it survives restarts. Every
//! change is broadcast on a watch channel; the UI subscribes to it and
//! routes to `/login` when the token disappears.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("empty token")]
    EmptyToken,
}

#[derive(Debug)]
struct Inner {
    file: Option<PathBuf>,
    tx: watch::Sender<Option<String>>,
}

/// Cheap-to-clone handle to the credential
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Session backed by a file; an existing token in it is restored
    pub fn persistent(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let token = read_token(&file);
        if token.is_some() {
            tracing::debug!("Restored session from {:?}", file);
        }
        let (tx, _) = watch::channel(token);
        Self {
            inner: Arc::new(Inner { file: Some(file), tx }),
        }
    }

    /// Session that lives only as long as the process
    pub fn in_memory() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner { file: None, tx }),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.inner.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.tx.borrow().is_some()
    }

    /// Store a freshly issued token
    pub fn sign_in(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        if let Some(path) = &self.inner.file {
            write_token(path, token)?;
        }
        self.inner.tx.send_replace(Some(token.to_string()));
        tracing::info!("Session started");
        Ok(())
    }

    /// Drop the token (logout or rejected credential)
    pub fn clear(&self) {
        if let Some(path) = &self.inner.file {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not remove session file {:?}: {}", path, e),
            }
        }
        let was_signed_in = self.inner.tx.send_replace(None).is_some();
        if was_signed_in {
            tracing::info!("Session cleared");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.tx.subscribe()
    }
}

fn read_token(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn write_token(path: &Path, token: &str) -> Result<(), SessionError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)
    };
    write().map_err(|source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("session");

        let session = Session::persistent(&file);
        assert!(!session.is_authenticated());
        session.sign_in("abc123").unwrap();

        let restored = Session::persistent(&file);
        assert_eq!(restored.token().as_deref(), Some("abc123"));

        restored.clear();
        assert!(!file.exists());
        assert!(Session::persistent(&file).token().is_none());
    }

    #[test]
    fn test_clear_is_observable() {
        let session = Session::in_memory();
        let mut rx = session.subscribe();
        session.sign_in("t").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_deref(), Some("t"));

        session.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn test_empty_token_rejected() {
        let session = Session::in_memory();
        assert!(matches!(session.sign_in("  "), Err(SessionError::EmptyToken)));
    }
}
