use thiserror::Error;

use crate::domain::{NotificationId, Role};

/// Failures surfaced by the authentication operations. Credential
/// rejection, unconfirmed accounts, and duplicate registrations are
/// distinct so forms can route the user sensibly; transport failures are
/// carried separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email, username, or password")]
    InvalidCredentials,
    #[error("account email has not been confirmed")]
    UnconfirmedAccount,
    #[error("an account with this email is already registered")]
    AlreadyRegistered,
    #[error("a sign-in attempt is already in progress")]
    InProgress,
    #[error(transparent)]
    Backend(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("backend request failed: {0}")]
    Network(String),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error("notification {0} has an unrecognized kind")]
    UnknownKind(NotificationId),
}

/// The active identity authenticated successfully but does not carry the
/// role a screen or flow requires. Never fatal: callers route the user to
/// a role-appropriate view and explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("active role {actual:?} does not satisfy required role {required:?}")]
pub struct RoleMismatch {
    pub required: Role,
    pub actual: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported color theme: {0}")]
pub struct UnknownColorTheme(pub String);
