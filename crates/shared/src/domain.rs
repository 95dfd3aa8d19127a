use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnknownColorTheme;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(NotificationId);
id_newtype!(SubmissionId);
id_newtype!(TaskId);
id_newtype!(MeetingId);
id_newtype!(PayoutId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Editor,
    Manager,
}

impl Role {
    /// Whether this role meets a minimum requirement. Managers satisfy an
    /// editor minimum; the reverse does not hold.
    pub fn satisfies(self, min: Role) -> bool {
        match min {
            Role::Editor => true,
            Role::Manager => self == Role::Manager,
        }
    }
}

/// Approval state of a non-guest account. Guests carry no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> ThemeMode {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

/// The fixed palette set. Anything outside it is rejected at the string
/// edge; the typed API cannot represent an unknown palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTheme {
    #[default]
    Orange,
    Blue,
    Red,
    Yellow,
    Green,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 5] = [
        ColorTheme::Orange,
        ColorTheme::Blue,
        ColorTheme::Red,
        ColorTheme::Yellow,
        ColorTheme::Green,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorTheme::Orange => "orange",
            ColorTheme::Blue => "blue",
            ColorTheme::Red => "red",
            ColorTheme::Yellow => "yellow",
            ColorTheme::Green => "green",
        }
    }
}

impl FromStr for ColorTheme {
    type Err = UnknownColorTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orange" => Ok(ColorTheme::Orange),
            "blue" => Ok(ColorTheme::Blue),
            "red" => Ok(ColorTheme::Red),
            "yellow" => Ok(ColorTheme::Yellow),
            "green" => Ok(ColorTheme::Green),
            other => Err(UnknownColorTheme(other.to_string())),
        }
    }
}

/// Token naming one reachable screen. The router holds exactly one of
/// these as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewName {
    #[default]
    Landing,
    Login,
    Signup,
    Apply,
    ManagerLogin,
    Home,
    Tasks,
    Meetings,
    Payouts,
    Approvals,
    UserManagement,
    Settings,
}

impl ViewName {
    /// Header title for the screen.
    pub fn title(self) -> &'static str {
        match self {
            ViewName::Home => "Home",
            ViewName::Tasks => "Tasks Management",
            ViewName::Meetings => "Meetings & Calendar",
            ViewName::Payouts => "Payouts",
            ViewName::Approvals => "User Approvals",
            ViewName::UserManagement => "User Submissions",
            ViewName::Settings => "Settings",
            _ => "Workspace",
        }
    }
}

/// Notification categories the backend emits. Rows with any other type
/// still deserialize (as `Other`) so a single bad row cannot poison a
/// whole fetch; resolving such a notification to a view fails instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Task,
    Meeting,
    Payout,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    Editing,
    CantDo,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutStatus {
    Pending,
    Done,
}
