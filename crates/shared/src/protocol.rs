use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ColorTheme, MeetingId, NotificationId, NotificationKind, PayoutId, PayoutStatus, Role, TaskId,
    TaskStatus, ThemeMode, UserId, UserStatus,
};

/// A user record as the backend stores it. The preference columns are
/// nullable; absent values default at load time (dark, orange, sound on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<ColorTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

/// Partial profile update. Only populated fields are serialized, so the
/// backend merges at field level rather than overwriting the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<ColorTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl ProfileUpdate {
    pub fn theme(theme: ThemeMode) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn color_theme(color_theme: ColorTheme) -> Self {
        Self {
            color_theme: Some(color_theme),
            ..Self::default()
        }
    }

    pub fn sound_enabled(sound_enabled: bool) -> Self {
        Self {
            sound_enabled: Some(sound_enabled),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.status.is_none()
            && self.theme.is_none()
            && self.color_theme.is_none()
            && self.sound_enabled.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// An application submitted from the public apply form. Always inserted
/// pending; management reviews it from the submissions screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    pub message: String,
    pub status: UserStatus,
}

impl NewSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        portfolio_url: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            portfolio_url,
            message: message.into(),
            status: UserStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: MeetingId,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub id: PayoutId,
    pub user_id: UserId,
    pub amount_cents: i64,
    pub status: PayoutStatus,
}
