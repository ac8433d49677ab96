//! Client-held session: bearer token plus cached user profile.
//!
//! The session is persisted redundantly in two stores, mirroring what a
//! browser client would do with `localStorage` and a cookie:
//!
//! - an in-memory cache, read on every outgoing request;
//! - a JSON file on disk, read once at startup so a fresh process knows
//!   whether it is authenticated before issuing any request.
//!
//! The token is opaque to the client. Signature and expiry verification
//! are the backend's concern; the only local check is the stored
//! max-age (24 hours, matching the token's nominal lifetime), after
//! which the session reads as absent.
//!
//! State machine: `Anonymous --login--> Authenticated --logout | 401 |
//! expiry--> Anonymous`. There is no refresh transition.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use taskdeck_api::User;

/// Session lifetime in seconds, matching the backend JWT expiry.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Errors that can occur while persisting the session file.
///
/// Read-side problems (missing, corrupt, expired file) are not errors:
/// they all degrade to an anonymous session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to write the session file.
    #[error("failed to write session file {path}: {source}")]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to serialize the session record.
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    /// Opaque bearer credential.
    token: String,
    /// Cached profile for display; meaningful only while `token` is.
    user: Option<User>,
    /// Unix timestamp after which the session reads as absent.
    expires_at: i64,
}

impl PersistedSession {
    fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// Single source of truth for the bearer token and cached profile.
///
/// Intended to be created once at startup and shared (`Arc`) with every
/// component that issues requests. All mutation goes through [`set`]
/// and [`clear`]; both are atomic with respect to concurrent readers.
///
/// [`set`]: SessionStore::set
/// [`clear`]: SessionStore::clear
pub struct SessionStore {
    inner: RwLock<Option<PersistedSession>>,
    path: PathBuf,
}

impl SessionStore {
    /// Loads the session from the persisted file at `path`.
    ///
    /// A missing file yields an anonymous session. A corrupt or expired
    /// file is discarded (with a warning for the corrupt case) rather
    /// than propagated: the worst outcome of a damaged session file is
    /// having to log in again.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<PersistedSession>(&contents) {
                Ok(session) if session.is_expired() => {
                    tracing::debug!(path = %path.display(), "stored session expired, discarding");
                    let _ = std::fs::remove_file(&path);
                    None
                }
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt session file, discarding");
                    let _ = std::fs::remove_file(&path);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read session file");
                None
            }
        };

        Self {
            inner: RwLock::new(inner),
            path,
        }
    }

    /// Creates an anonymous in-memory store backed by `path`.
    ///
    /// Unlike [`load`](Self::load) this never touches the filesystem;
    /// used by tests and by callers that know there is no prior session.
    #[must_use]
    pub fn anonymous(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(None),
            path: path.into(),
        }
    }

    /// Returns the bearer token, or `None` when anonymous or expired.
    ///
    /// Never performs network I/O and never blocks on anything slower
    /// than the in-process lock. An expired session reads as absent;
    /// the stale copies are purged on the way out.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        let expired = {
            let guard = self.inner.read();
            match guard.as_ref() {
                Some(s) if s.is_expired() => true,
                Some(s) => return Some(s.token.clone()),
                None => return None,
            }
        };
        if expired {
            tracing::info!("session reached max age, clearing");
            self.clear();
        }
        None
    }

    /// Returns the cached user profile, or `None` when anonymous.
    ///
    /// Gated on the token: a profile without a live token is never
    /// surfaced, so authentication cannot be inferred from `user` alone.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let guard = self.inner.read();
        guard
            .as_ref()
            .filter(|s| !s.is_expired())
            .and_then(|s| s.user.clone())
    }

    /// Returns true when a live token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persists a new session in both stores, overwriting any previous
    /// one. The expiry is set to now + 24h.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session file cannot be written.
    /// The in-memory copy is updated regardless, so the current process
    /// stays authenticated even when the disk write fails.
    pub fn set(&self, token: impl Into<String>, user: Option<User>) -> Result<(), SessionError> {
        let session = PersistedSession {
            token: token.into(),
            user,
            expires_at: Utc::now().timestamp() + SESSION_TTL_SECS,
        };
        *self.inner.write() = Some(session.clone());
        self.persist(&session)
    }

    /// Removes both persisted copies. Idempotent.
    pub fn clear(&self) {
        *self.inner.write() = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove session file");
            }
        }
    }

    /// Path of the on-disk store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let contents = serde_json::to_string(session)?;
        std::fs::write(&self.path, contents).map_err(|e| SessionError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        // The token is a credential: owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = std::fs::set_permissions(&self.path, perms) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to restrict session file permissions");
            }
        }

        Ok(())
    }
}
