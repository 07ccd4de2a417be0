//! Session state and role-based access control
//!
//! A [`Session`] is created once at process start from persisted storage and
//! then passed explicitly to whatever needs the signed-in user or token.
//! Login and registration establish it; logout clears both memory and storage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::entities::{AuthResponse, RoleName, UserProfile};

/// Storage key of the serialized user profile
pub const USER_KEY: &str = "user";

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "accessToken";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Run 'drx login' first")]
    NotLoggedIn,

    #[error("Access denied: {view} requires one of {required}")]
    AccessDenied { view: View, required: String },

    #[error("Session storage error at {}: {source}", path.display())]
    Storage { path: PathBuf, source: io::Error },

    #[error("Stored user profile is corrupt: {0}")]
    Corrupt(String),
}

/// File-backed key/value storage for the two session entries
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionError::Storage { path, source }),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir).map_err(|source| SessionError::Storage {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(key);
        fs::write(&path, value).map_err(|source| SessionError::Storage { path, source })
    }

    pub fn remove(&self, key: &str) -> Result<(), SessionError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Storage { path, source }),
        }
    }
}

/// Views of the application and the roles they accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Products,
    Users,
    Dashboard,
}

impl View {
    pub const ALL: [View; 4] = [View::Home, View::Products, View::Users, View::Dashboard];

    /// Roles accepted by this view; empty means any signed-in user
    pub fn required_roles(&self) -> &'static [RoleName] {
        match self {
            View::Home | View::Products => &[],
            View::Users | View::Dashboard => &[RoleName::Admin],
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Home => write!(f, "home"),
            View::Products => write!(f, "products"),
            View::Users => write!(f, "users"),
            View::Dashboard => write!(f, "dashboard"),
        }
    }
}

/// Whether a set of role names satisfies a requirement
///
/// Access is granted when the requirement is empty or shares at least one role
/// with the user. Roles have no hierarchy.
pub fn can_access<S: AsRef<str>>(user_roles: &[S], required: &[RoleName]) -> bool {
    required.is_empty()
        || required
            .iter()
            .any(|r| user_roles.iter().any(|u| u.as_ref() == r.as_str()))
}

/// Signed-in user and bearer token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<UserProfile>,
    token: Option<String>,
}

impl Session {
    /// Restore the session saved by a previous run
    ///
    /// Both entries must be present; a lone profile or token is ignored.
    pub fn hydrate(store: &SessionStore) -> Result<Self, SessionError> {
        let user = store.get(USER_KEY)?;
        let token = store.get(TOKEN_KEY)?;

        match (user, token) {
            (Some(user), Some(token)) if !token.trim().is_empty() => {
                let profile: UserProfile = serde_json::from_str(&user)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                Ok(Self {
                    user: Some(profile),
                    token: Some(token.trim().to_string()),
                })
            }
            _ => Ok(Self::default()),
        }
    }

    /// Adopt a successful login/registration and persist it
    pub fn establish(
        &mut self,
        store: &SessionStore,
        response: AuthResponse,
    ) -> Result<&UserProfile, SessionError> {
        let (profile, token) = response.into_parts();
        let serialized =
            serde_json::to_string(&profile).map_err(|e| SessionError::Corrupt(e.to_string()))?;

        store.set(TOKEN_KEY, &token)?;
        store.set(USER_KEY, &serialized)?;
        info!("session established for {}", profile.username);

        self.token = Some(token);
        Ok(self.user.insert(profile))
    }

    /// Forget the session in memory and in storage
    pub fn clear(&mut self, store: &SessionStore) -> Result<(), SessionError> {
        store.remove(TOKEN_KEY)?;
        store.remove(USER_KEY)?;
        if let Some(user) = self.user.take() {
            info!("session cleared for {}", user.username);
        }
        self.token = None;
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.user.as_ref().is_some_and(|u| u.has_role(role))
    }

    /// Administrators get extra affordances such as delete actions
    pub fn is_admin(&self) -> bool {
        self.has_role(RoleName::Admin)
    }

    /// Stage changes are offered to administrators and designers
    pub fn can_change_stage(&self) -> bool {
        self.has_role(RoleName::Admin) || self.has_role(RoleName::Designer)
    }

    /// Check that the signed-in user may open `view`
    pub fn authorize(&self, view: View) -> Result<&UserProfile, SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let required = view.required_roles();
        if can_access(&user.roles, required) {
            Ok(user)
        } else {
            Err(SessionError::AccessDenied {
                view,
                required: required
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}
