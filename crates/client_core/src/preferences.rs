use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::warn;

use shared::{
    domain::{ColorTheme, ThemeMode},
    error::PersistenceError,
    protocol::{ProfileUpdate, UserProfile},
};
use storage::LocalStore;

use crate::{session::SessionManager, WorkspaceEvent};

pub const THEME_KEY: &str = "idyll_theme";
pub const COLOR_THEME_KEY: &str = "idyll_color_theme";
pub const SOUND_KEY: &str = "idyll_sound_enabled";

/// The full preference surface. Defaults match a fresh account: dark
/// theme, orange palette, sound on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference {
    pub theme: ThemeMode,
    pub color_theme: ColorTheme,
    pub sound_enabled: bool,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            color_theme: ColorTheme::Orange,
            sound_enabled: true,
        }
    }
}

/// A single-field preference write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceChange {
    Theme(ThemeMode),
    ColorTheme(ColorTheme),
    SoundEnabled(bool),
}

impl PreferenceChange {
    fn apply(self, preference: &mut Preference) {
        match self {
            PreferenceChange::Theme(theme) => preference.theme = theme,
            PreferenceChange::ColorTheme(color_theme) => preference.color_theme = color_theme,
            PreferenceChange::SoundEnabled(sound_enabled) => {
                preference.sound_enabled = sound_enabled
            }
        }
    }
}

/// Where preferences load from and persist to. Rebound whenever the
/// identity changes: profile columns for signed-in users, the device
/// store for everyone else.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    fn load(&self) -> Preference;
    async fn persist(&self, change: PreferenceChange) -> Result<(), PersistenceError>;
}

/// Persists into the signed-in user's profile row, one column per write.
/// Writes go through the session manager so its cached profile picks up
/// the change too; once the identity moves on, a late write is a no-op.
pub struct ProfileBacked {
    session: Arc<SessionManager>,
    snapshot: Preference,
    user: shared::domain::UserId,
}

impl ProfileBacked {
    pub fn new(session: Arc<SessionManager>, profile: &UserProfile) -> Self {
        Self {
            session,
            user: profile.id,
            snapshot: Preference {
                theme: profile.theme.unwrap_or_default(),
                color_theme: profile.color_theme.unwrap_or_default(),
                sound_enabled: profile.sound_enabled.unwrap_or(true),
            },
        }
    }
}

#[async_trait]
impl PreferenceBackend for ProfileBacked {
    fn load(&self) -> Preference {
        self.snapshot
    }

    async fn persist(&self, change: PreferenceChange) -> Result<(), PersistenceError> {
        let update = match change {
            PreferenceChange::Theme(theme) => ProfileUpdate::theme(theme),
            PreferenceChange::ColorTheme(color_theme) => ProfileUpdate::color_theme(color_theme),
            PreferenceChange::SoundEnabled(sound_enabled) => {
                ProfileUpdate::sound_enabled(sound_enabled)
            }
        };
        self.session.update_user(self.user, &update).await
    }
}

/// Persists into the device-local store under the legacy key names, with
/// the lenient read rules those keys always had: any theme value other
/// than "light" reads dark, sound is on unless the literal "false" is
/// stored, and an unknown palette string falls back to the default.
pub struct LocalBacked {
    store: Arc<LocalStore>,
}

impl LocalBacked {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

fn local_write_failed(err: anyhow::Error) -> PersistenceError {
    PersistenceError::Rejected(format!("local preference write failed: {err}"))
}

#[async_trait]
impl PreferenceBackend for LocalBacked {
    fn load(&self) -> Preference {
        let theme = if self.store.get(THEME_KEY).as_deref() == Some("light") {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        };
        let color_theme = self
            .store
            .get(COLOR_THEME_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let sound_enabled = self.store.get(SOUND_KEY).as_deref() != Some("false");
        Preference {
            theme,
            color_theme,
            sound_enabled,
        }
    }

    async fn persist(&self, change: PreferenceChange) -> Result<(), PersistenceError> {
        match change {
            PreferenceChange::Theme(theme) => self.store.set(THEME_KEY, theme.as_str()),
            PreferenceChange::ColorTheme(color_theme) => {
                self.store.set(COLOR_THEME_KEY, color_theme.as_str())
            }
            PreferenceChange::SoundEnabled(sound_enabled) => {
                self.store.set(SOUND_KEY, if sound_enabled { "true" } else { "false" })
            }
        }
        .map_err(local_write_failed)
    }
}

/// In-memory preference state with write-behind persistence.
///
/// Setters apply synchronously and stay applied even when the write
/// behind them fails; the failure is reported as an event instead of
/// rolled back. Writes are serialized so a slow persist cannot land
/// after a newer one.
pub struct PreferenceStore {
    current: RwLock<Preference>,
    backend: StdMutex<Arc<dyn PreferenceBackend>>,
    write_order: Mutex<()>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl PreferenceStore {
    pub(crate) fn new(
        backend: Arc<dyn PreferenceBackend>,
        events: broadcast::Sender<WorkspaceEvent>,
    ) -> Self {
        let current = backend.load();
        Self {
            current: RwLock::new(current),
            backend: StdMutex::new(backend),
            write_order: Mutex::new(()),
            events,
        }
    }

    pub fn current(&self) -> Preference {
        *self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Swaps the persistence target and reloads from it. Called on every
    /// identity change.
    pub fn rebind(&self, backend: Arc<dyn PreferenceBackend>) {
        let loaded = backend.load();
        *self.backend.lock().unwrap_or_else(PoisonError::into_inner) = backend;
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = loaded;
        let _ = self.events.send(WorkspaceEvent::PreferenceChanged(loaded));
    }

    pub async fn set_theme(&self, theme: ThemeMode) {
        self.apply(PreferenceChange::Theme(theme)).await;
    }

    pub async fn toggle_theme(&self) -> ThemeMode {
        let theme = self.current().theme.toggled();
        self.set_theme(theme).await;
        theme
    }

    pub async fn set_color_theme(&self, color_theme: ColorTheme) {
        self.apply(PreferenceChange::ColorTheme(color_theme)).await;
    }

    pub async fn set_sound_enabled(&self, sound_enabled: bool) {
        self.apply(PreferenceChange::SoundEnabled(sound_enabled))
            .await;
    }

    pub async fn toggle_sound(&self) -> bool {
        let sound_enabled = !self.current().sound_enabled;
        self.set_sound_enabled(sound_enabled).await;
        sound_enabled
    }

    async fn apply(&self, change: PreferenceChange) {
        let updated = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            change.apply(&mut current);
            *current
        };
        let _ = self.events.send(WorkspaceEvent::PreferenceChanged(updated));

        // Snapshot the binding now so a rebind mid-write cannot route this
        // change to the next identity's backend.
        let backend = self
            .backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let _order = self.write_order.lock().await;
        if let Err(err) = backend.persist(change).await {
            warn!(error = %err, "preference write failed; keeping the applied value");
            let _ = self
                .events
                .send(WorkspaceEvent::PersistenceFailed(err.to_string()));
        }
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
