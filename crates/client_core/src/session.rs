use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use shared::{
    domain::{Role, UserId, UserStatus},
    error::{AuthError, PersistenceError, RoleMismatch},
    protocol::{ProfileUpdate, UserProfile},
};

use crate::{backend::WorkspaceBackend, WorkspaceEvent};

/// Who the workspace currently acts as. Guests carry a role but no
/// profile or approval status; anonymous sessions carry neither.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Authenticated(UserProfile),
    Guest { role: Role },
    Anonymous,
}

impl Identity {
    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Authenticated(profile) => Some(profile.role),
            Identity::Guest { role } => Some(*role),
            Identity::Anonymous => None,
        }
    }

    pub fn status(&self) -> Option<UserStatus> {
        match self {
            Identity::Authenticated(profile) => Some(profile.status),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Identity::Authenticated(profile) => Some(profile.id),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Identity::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    RoleMismatch(#[from] RoleMismatch),
}

struct SessionState {
    identity: Identity,
    sign_in_in_flight: bool,
}

/// Owns the active identity and every transition into and out of it.
pub struct SessionManager {
    backend: Arc<dyn WorkspaceBackend>,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl SessionManager {
    pub(crate) fn new(
        backend: Arc<dyn WorkspaceBackend>,
        events: broadcast::Sender<WorkspaceEvent>,
    ) -> Self {
        Self {
            backend,
            inner: Mutex::new(SessionState {
                identity: Identity::Anonymous,
                sign_in_in_flight: false,
            }),
            events,
        }
    }

    pub async fn identity(&self) -> Identity {
        self.inner.lock().await.identity.clone()
    }

    /// Sign in with an email or a username. At most one attempt runs at a
    /// time; a second call while one is pending fails fast instead of
    /// racing it.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<Identity, AuthError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.sign_in_in_flight {
                return Err(AuthError::InProgress);
            }
            guard.sign_in_in_flight = true;
        }

        let result = self.authenticate(identifier, password).await;

        let mut guard = self.inner.lock().await;
        guard.sign_in_in_flight = false;
        match result {
            Ok(profile) => {
                info!(user_id = %profile.id, role = ?profile.role, "signed in");
                guard.identity = Identity::Authenticated(profile);
                let identity = guard.identity.clone();
                drop(guard);
                let _ = self
                    .events
                    .send(WorkspaceEvent::IdentityChanged(identity.clone()));
                Ok(identity)
            }
            Err(err) => {
                drop(guard);
                debug!(error = %err, "sign-in failed");
                Err(err)
            }
        }
    }

    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let email = if identifier.contains('@') {
            identifier.to_string()
        } else {
            self.backend
                .lookup_email(identifier)
                .await?
                .ok_or(AuthError::InvalidCredentials)?
        };
        self.backend.sign_in(&email, password).await
    }

    /// Self-serve registration. Every new account starts as a pending
    /// editor; a manager promotes and approves from the workspace.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Identity, AuthError> {
        let profile = self
            .backend
            .sign_up(email, password, username, Role::Editor)
            .await?;
        info!(user_id = %profile.id, "account registered, awaiting approval");
        let identity = Identity::Authenticated(profile);
        self.inner.lock().await.identity = identity.clone();
        let _ = self
            .events
            .send(WorkspaceEvent::IdentityChanged(identity.clone()));
        Ok(identity)
    }

    pub async fn sign_in_as_guest(&self, role: Role) -> Identity {
        let identity = Identity::Guest { role };
        self.inner.lock().await.identity = identity.clone();
        info!(?role, "guest session started");
        let _ = self
            .events
            .send(WorkspaceEvent::IdentityChanged(identity.clone()));
        identity
    }

    pub async fn sign_out(&self) -> Identity {
        self.inner.lock().await.identity = Identity::Anonymous;
        info!("signed out");
        let _ = self
            .events
            .send(WorkspaceEvent::IdentityChanged(Identity::Anonymous));
        Identity::Anonymous
    }

    pub async fn require_role(&self, required: Role) -> Result<(), RoleMismatch> {
        let actual = self.identity().await.role();
        match actual {
            Some(role) if role.satisfies(required) => Ok(()),
            actual => Err(RoleMismatch { required, actual }),
        }
    }

    /// Persists a partial profile update for the signed-in user and merges
    /// it into the cached profile. Guests and anonymous sessions have no
    /// profile row, so the call is a logged no-op for them, as it is for
    /// an id that is not the active user's.
    pub async fn update_user(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        let is_active_user = matches!(
            &self.inner.lock().await.identity,
            Identity::Authenticated(profile) if profile.id == id
        );
        if !is_active_user {
            debug!(%id, "profile update skipped; not the signed-in user");
            return Ok(());
        }

        self.backend.update_profile(id, update).await?;

        let mut guard = self.inner.lock().await;
        let mut changed = false;
        if let Identity::Authenticated(profile) = &mut guard.identity {
            if profile.id == id {
                if let Some(username) = &update.username {
                    profile.username = username.clone();
                }
                if let Some(status) = update.status {
                    profile.status = status;
                }
                if let Some(theme) = update.theme {
                    profile.theme = Some(theme);
                }
                if let Some(color_theme) = update.color_theme {
                    profile.color_theme = Some(color_theme);
                }
                if let Some(sound_enabled) = update.sound_enabled {
                    profile.sound_enabled = Some(sound_enabled);
                }
                changed = true;
            }
        }
        let identity = guard.identity.clone();
        drop(guard);
        if changed {
            let _ = self.events.send(WorkspaceEvent::IdentityChanged(identity));
        }
        Ok(())
    }
}
