use super::*;

use uuid::Uuid;

use crate::backend::WorkspaceBackend;
use shared::{
    domain::{NotificationId, Role, UserId, UserStatus},
    error::{AuthError, UnknownColorTheme},
    protocol::{
        MeetingRecord, NewSubmission, NotificationRecord, PayoutRecord, TaskRecord, UserProfile,
    },
};

fn events() -> broadcast::Sender<WorkspaceEvent> {
    broadcast::channel(16).0
}

fn local_store(dir: &tempfile::TempDir) -> Arc<LocalStore> {
    Arc::new(LocalStore::open(dir.path().join("prefs.json")).expect("open store"))
}

struct RecordingPrefs {
    loaded: Preference,
    changes: StdMutex<Vec<PreferenceChange>>,
}

impl RecordingPrefs {
    fn new(loaded: Preference) -> Arc<Self> {
        Arc::new(Self {
            loaded,
            changes: StdMutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PreferenceBackend for RecordingPrefs {
    fn load(&self) -> Preference {
        self.loaded
    }

    async fn persist(&self, change: PreferenceChange) -> Result<(), PersistenceError> {
        self.changes.lock().expect("changes").push(change);
        Ok(())
    }
}

struct FailingPrefs;

#[async_trait]
impl PreferenceBackend for FailingPrefs {
    fn load(&self) -> Preference {
        Preference::default()
    }

    async fn persist(&self, _change: PreferenceChange) -> Result<(), PersistenceError> {
        Err(PersistenceError::Network("connection reset".to_string()))
    }
}

struct RecordingWorkspace {
    profile: UserProfile,
    updates: StdMutex<Vec<(UserId, ProfileUpdate)>>,
}

impl RecordingWorkspace {
    fn new(profile: UserProfile) -> Arc<Self> {
        Arc::new(Self {
            profile,
            updates: StdMutex::new(Vec::new()),
        })
    }

    fn session_manager(self: &Arc<Self>) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(self.clone(), events()))
    }
}

#[async_trait]
impl WorkspaceBackend for RecordingWorkspace {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<UserProfile, AuthError> {
        Ok(self.profile.clone())
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _username: &str,
        _role: Role,
    ) -> Result<UserProfile, AuthError> {
        unimplemented!()
    }

    async fn lookup_email(&self, _username: &str) -> Result<Option<String>, PersistenceError> {
        unimplemented!()
    }

    async fn fetch_profile(&self, _id: UserId) -> Result<UserProfile, PersistenceError> {
        unimplemented!()
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        self.updates.lock().expect("updates").push((id, update.clone()));
        Ok(())
    }

    async fn fetch_notifications(
        &self,
        _user: UserId,
    ) -> Result<Vec<NotificationRecord>, PersistenceError> {
        unimplemented!()
    }

    async fn mark_notification_read(&self, _id: NotificationId) -> Result<(), PersistenceError> {
        unimplemented!()
    }

    async fn insert_submission(&self, _submission: &NewSubmission) -> Result<(), PersistenceError> {
        unimplemented!()
    }

    async fn fetch_users(&self) -> Result<Vec<UserProfile>, PersistenceError> {
        unimplemented!()
    }

    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, PersistenceError> {
        unimplemented!()
    }

    async fn fetch_meetings(&self) -> Result<Vec<MeetingRecord>, PersistenceError> {
        unimplemented!()
    }

    async fn fetch_payouts(&self) -> Result<Vec<PayoutRecord>, PersistenceError> {
        unimplemented!()
    }
}

#[test]
fn empty_store_loads_the_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backed = LocalBacked::new(local_store(&dir));
    assert_eq!(backed.load(), Preference::default());
}

#[test]
fn local_reads_are_lenient() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = local_store(&dir);
    store.set(THEME_KEY, "LIGHT").expect("set");
    store.set(COLOR_THEME_KEY, "purple").expect("set");
    store.set(SOUND_KEY, "0").expect("set");

    // Only the exact strings "light" and "false" change anything.
    let loaded = LocalBacked::new(store.clone()).load();
    assert_eq!(loaded.theme, ThemeMode::Dark);
    assert_eq!(loaded.color_theme, ColorTheme::Orange);
    assert!(loaded.sound_enabled);

    store.set(THEME_KEY, "light").expect("set");
    store.set(COLOR_THEME_KEY, "green").expect("set");
    store.set(SOUND_KEY, "false").expect("set");
    let loaded = LocalBacked::new(store).load();
    assert_eq!(loaded.theme, ThemeMode::Light);
    assert_eq!(loaded.color_theme, ColorTheme::Green);
    assert!(!loaded.sound_enabled);
}

#[test]
fn unknown_palette_strings_fail_to_parse() {
    let err = "purple".parse::<ColorTheme>().expect_err("reject");
    assert_eq!(err, UnknownColorTheme("purple".to_string()));
}

#[tokio::test]
async fn local_writes_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.json");
    {
        let store = Arc::new(LocalStore::open(&path).expect("open"));
        let prefs = PreferenceStore::new(Arc::new(LocalBacked::new(store)), events());
        prefs.set_theme(ThemeMode::Light).await;
        prefs.set_color_theme(ColorTheme::Green).await;
        prefs.set_sound_enabled(false).await;
    }

    let reopened = Arc::new(LocalStore::open(&path).expect("reopen"));
    let loaded = LocalBacked::new(reopened).load();
    assert_eq!(
        loaded,
        Preference {
            theme: ThemeMode::Light,
            color_theme: ColorTheme::Green,
            sound_enabled: false,
        }
    );
}

#[tokio::test]
async fn profile_backend_writes_one_column_per_change() {
    let profile = UserProfile {
        id: UserId(Uuid::new_v4()),
        username: "casey".to_string(),
        email: "casey@example.com".to_string(),
        role: Role::Editor,
        status: UserStatus::Approved,
        theme: Some(ThemeMode::Light),
        color_theme: Some(ColorTheme::Blue),
        sound_enabled: Some(false),
    };
    let backend = RecordingWorkspace::new(profile.clone());
    let session = backend.session_manager();
    session
        .sign_in(&profile.email, "hunter2")
        .await
        .expect("sign in");
    let backed = ProfileBacked::new(session.clone(), &profile);

    assert_eq!(
        backed.load(),
        Preference {
            theme: ThemeMode::Light,
            color_theme: ColorTheme::Blue,
            sound_enabled: false,
        }
    );

    backed
        .persist(PreferenceChange::Theme(ThemeMode::Dark))
        .await
        .expect("persist");
    backed
        .persist(PreferenceChange::SoundEnabled(true))
        .await
        .expect("persist");

    let updates = backend.updates.lock().expect("updates");
    assert_eq!(
        *updates,
        vec![
            (profile.id, ProfileUpdate::theme(ThemeMode::Dark)),
            (profile.id, ProfileUpdate::sound_enabled(true)),
        ]
    );
    drop(updates);

    // The session's cached profile saw the same writes.
    let identity = session.identity().await;
    let cached = identity.profile().expect("authenticated");
    assert_eq!(cached.theme, Some(ThemeMode::Dark));
    assert_eq!(cached.sound_enabled, Some(true));
    assert_eq!(cached.color_theme, Some(ColorTheme::Blue));
}

#[tokio::test]
async fn stale_profile_writes_after_sign_out_are_discarded() {
    let profile = UserProfile {
        id: UserId(Uuid::new_v4()),
        username: "casey".to_string(),
        email: "casey@example.com".to_string(),
        role: Role::Editor,
        status: UserStatus::Approved,
        theme: None,
        color_theme: None,
        sound_enabled: None,
    };
    let backend = RecordingWorkspace::new(profile.clone());
    let session = backend.session_manager();
    session
        .sign_in(&profile.email, "hunter2")
        .await
        .expect("sign in");
    let backed = ProfileBacked::new(session.clone(), &profile);
    session.sign_out().await;

    backed
        .persist(PreferenceChange::Theme(ThemeMode::Light))
        .await
        .expect("discarded write");
    assert!(backend.updates.lock().expect("updates").is_empty());
}

#[tokio::test]
async fn unset_profile_columns_fall_back_to_defaults() {
    let profile = UserProfile {
        id: UserId(Uuid::new_v4()),
        username: "casey".to_string(),
        email: "casey@example.com".to_string(),
        role: Role::Editor,
        status: UserStatus::Approved,
        theme: None,
        color_theme: None,
        sound_enabled: None,
    };
    let backend = RecordingWorkspace::new(profile.clone());
    assert_eq!(
        ProfileBacked::new(backend.session_manager(), &profile).load(),
        Preference::default()
    );
}

#[tokio::test]
async fn failed_writes_keep_the_applied_value() {
    let sender = events();
    let mut receiver = sender.subscribe();
    let prefs = PreferenceStore::new(Arc::new(FailingPrefs), sender);

    prefs.set_theme(ThemeMode::Light).await;

    assert_eq!(prefs.current().theme, ThemeMode::Light);
    assert!(matches!(
        receiver.try_recv(),
        Ok(WorkspaceEvent::PreferenceChanged(applied)) if applied.theme == ThemeMode::Light
    ));
    assert!(matches!(
        receiver.try_recv(),
        Ok(WorkspaceEvent::PersistenceFailed(_))
    ));
}

#[tokio::test]
async fn toggles_flip_and_persist() {
    let backend = RecordingPrefs::new(Preference::default());
    let prefs = PreferenceStore::new(backend.clone(), events());

    assert_eq!(prefs.toggle_theme().await, ThemeMode::Light);
    assert_eq!(prefs.toggle_theme().await, ThemeMode::Dark);
    assert!(!prefs.toggle_sound().await);

    let changes = backend.changes.lock().expect("changes");
    assert_eq!(
        *changes,
        vec![
            PreferenceChange::Theme(ThemeMode::Light),
            PreferenceChange::Theme(ThemeMode::Dark),
            PreferenceChange::SoundEnabled(false),
        ]
    );
}

#[test]
fn rebind_reloads_from_the_new_backend() {
    let prefs = PreferenceStore::new(RecordingPrefs::new(Preference::default()), events());
    let custom = Preference {
        theme: ThemeMode::Light,
        color_theme: ColorTheme::Red,
        sound_enabled: false,
    };
    prefs.rebind(RecordingPrefs::new(custom));
    assert_eq!(prefs.current(), custom);
}
