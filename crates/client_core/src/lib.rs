//! Client-side coordination layer for the workspace: session identity,
//! view routing, notifications, preferences, and the modal dialog slot,
//! all in front of a pluggable persistence backend.

pub mod backend;
pub mod dialog;
pub mod notifications;
pub mod preferences;
pub mod records;
pub mod refresh;
pub mod router;
pub mod session;
pub mod style;

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;
use tracing::warn;

use shared::{
    domain::{NotificationId, Role, UserId, ViewName},
    error::{AuthError, NotificationError, PersistenceError},
    protocol::{NewSubmission, ProfileUpdate, UserProfile},
};
use storage::LocalStore;

pub use backend::{MissingBackend, RestBackend, WorkspaceBackend};
pub use dialog::{
    ActionSnapshot, DialogAction, DialogError, DialogKind, DialogRequest, DialogService,
    DialogSnapshot,
};
pub use notifications::{resolve_target, NotificationCenter};
pub use preferences::{
    LocalBacked, Preference, PreferenceBackend, PreferenceChange, PreferenceStore, ProfileBacked,
};
pub use records::{
    approved_editors, summarize_payouts, summarize_tasks, summarize_tasks_for, DashboardSnapshot,
    PayoutSummary, TaskSummary,
};
pub use refresh::RefreshTask;
pub use router::{
    evaluate_entry, requirement, EntryDecision, RedirectReason, ViewRequirement, ViewRouter,
};
pub use session::{Identity, SessionError, SessionManager};
pub use style::StyleTokens;

/// State-change notifications fanned out to subscribers. Slow receivers
/// may lag and miss events; every event carries enough to resynchronize
/// from the owning component.
#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    IdentityChanged(Identity),
    ViewChanged(ViewName),
    PreferenceChanged(Preference),
    NotificationsUpdated { unread: usize },
    PersistenceFailed(String),
}

/// Owns every coordination component and keeps them consistent across
/// identity changes.
pub struct Workspace {
    backend: Arc<dyn WorkspaceBackend>,
    local_store: Arc<LocalStore>,
    pub session: Arc<SessionManager>,
    pub router: ViewRouter,
    pub notifications: NotificationCenter,
    pub preferences: PreferenceStore,
    pub dialogs: Arc<DialogService>,
    notification_refresh: RefreshTask,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl Workspace {
    pub fn new(backend: Arc<dyn WorkspaceBackend>, local_store: Arc<LocalStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let preferences = PreferenceStore::new(
            Arc::new(LocalBacked::new(local_store.clone())),
            events.clone(),
        );
        Arc::new(Self {
            session: Arc::new(SessionManager::new(backend.clone(), events.clone())),
            router: ViewRouter::new(events.clone()),
            notifications: NotificationCenter::new(events.clone()),
            preferences,
            dialogs: Arc::new(DialogService::new()),
            notification_refresh: RefreshTask::new(),
            backend,
            local_store,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    pub fn style_tokens(&self) -> StyleTokens {
        style::compute(&self.preferences.current())
    }

    /// Rebinds preferences and reloads notifications for the identity
    /// that just became active.
    async fn apply_identity(&self, identity: &Identity) {
        match identity {
            Identity::Authenticated(profile) => {
                self.preferences
                    .rebind(Arc::new(ProfileBacked::new(self.session.clone(), profile)));
            }
            _ => {
                self.preferences
                    .rebind(Arc::new(LocalBacked::new(self.local_store.clone())));
            }
        }
        self.refresh_notifications().await;
    }

    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.session.sign_in(identifier, password).await?;
        self.apply_identity(&identity).await;
        Ok(identity)
    }

    /// Sign-in for a portal that demands a role. Authentication itself
    /// can still succeed while the role check fails; in that case the
    /// identity stays signed in, an access-denied dialog with routing
    /// choices is raised, and the router falls back to the login screen.
    pub async fn sign_in_for(
        self: &Arc<Self>,
        identifier: &str,
        password: &str,
        required: Role,
    ) -> Result<Identity, SessionError> {
        let identity = self.sign_in(identifier, password).await?;
        if let Err(mismatch) = self.session.require_role(required).await {
            let portal = match required {
                Role::Manager => "managers",
                Role::Editor => "editors",
            };
            let to_login = {
                let workspace = Arc::clone(self);
                move || workspace.router.set_view(ViewName::Login)
            };
            let to_landing = {
                let workspace = Arc::clone(self);
                move || workspace.router.set_view(ViewName::Landing)
            };
            self.dialogs.show(
                DialogRequest::new(
                    DialogKind::Error,
                    "Access denied",
                    format!("This login is for {portal} only."),
                )
                .with_action(DialogAction::new("Go to editor login", true, to_login))
                .with_action(DialogAction::new("Back to home", false, to_landing)),
            );
            self.router.set_view(ViewName::Login);
            return Err(SessionError::from(mismatch));
        }
        Ok(identity)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Identity, AuthError> {
        let identity = self.session.sign_up(email, password, username).await?;
        self.apply_identity(&identity).await;
        Ok(identity)
    }

    pub async fn sign_in_as_guest(&self, role: Role) -> Identity {
        let identity = self.session.sign_in_as_guest(role).await;
        self.apply_identity(&identity).await;
        identity
    }

    pub async fn sign_out(&self) {
        self.notification_refresh.stop();
        self.session.sign_out().await;
        self.notifications.clear();
        self.preferences
            .rebind(Arc::new(LocalBacked::new(self.local_store.clone())));
        self.router.set_view(ViewName::Landing);
    }

    /// Gated navigation: evaluates the view's entry requirement against
    /// the active identity and lands on the view or its redirect target.
    pub async fn enter_view(&self, view: ViewName) -> EntryDecision {
        let identity = self.session.identity().await;
        self.router.enter(view, &identity)
    }

    /// Marks the notification read, then navigates to the screen for its
    /// subject. A notification whose kind has no screen is still marked
    /// read but navigation stays put; the read receipt is written to the
    /// backend best-effort.
    pub async fn open_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<ViewName>, NotificationError> {
        let flipped = self.notifications.mark_as_read(id)?;
        if flipped {
            if let Err(err) = self.backend.mark_notification_read(id).await {
                warn!(%id, error = %err, "notification read receipt not persisted");
                let _ = self
                    .events
                    .send(WorkspaceEvent::PersistenceFailed(err.to_string()));
            }
        }
        let record = self
            .notifications
            .get(id)
            .ok_or(NotificationError::NotFound(id))?;
        match resolve_target(&record) {
            Ok(view) => {
                let identity = self.session.identity().await;
                self.router.enter(view, &identity);
                Ok(Some(view))
            }
            Err(NotificationError::UnknownKind(id)) => {
                warn!(%id, "notification kind has no screen");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Reloads the notification list from the backend. Sessions without
    /// a profile have no server-side notifications and get an empty list.
    pub async fn refresh_notifications(&self) {
        let Some(user) = self.session.identity().await.user_id() else {
            self.notifications.clear();
            return;
        };
        match self.backend.fetch_notifications(user).await {
            Ok(records) => self.notifications.replace_all(records),
            Err(err) => warn!(error = %err, "notification refresh failed"),
        }
    }

    pub fn start_notification_refresh(self: &Arc<Self>, period: Duration) {
        let workspace = Arc::clone(self);
        self.notification_refresh.start(period, move || {
            let workspace = Arc::clone(&workspace);
            async move { workspace.refresh_notifications().await }
        });
    }

    pub fn stop_notification_refresh(&self) {
        self.notification_refresh.stop();
    }

    pub async fn update_user(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        self.session.update_user(id, update).await
    }

    /// Public apply form. On success a confirmation dialog is raised.
    pub async fn submit_application(
        &self,
        submission: NewSubmission,
    ) -> Result<(), PersistenceError> {
        self.backend.insert_submission(&submission).await?;
        self.dialogs.show(DialogRequest::new(
            DialogKind::Success,
            "Application received",
            "Thanks for applying. Submissions are reviewed within a few days.",
        ));
        Ok(())
    }

    pub async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, PersistenceError> {
        let tasks = self.backend.fetch_tasks().await?;
        let meetings = self.backend.fetch_meetings().await?;
        let payouts = self.backend.fetch_payouts().await?;
        Ok(DashboardSnapshot {
            tasks,
            meetings,
            payouts,
        })
    }

    pub async fn fetch_users(&self) -> Result<Vec<UserProfile>, PersistenceError> {
        self.backend.fetch_users().await
    }
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
