use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use shared::{
    domain::{NotificationId, Role, UserId, UserStatus},
    error::{AuthError, PersistenceError},
    protocol::{
        MeetingRecord, NewSubmission, NotificationRecord, PayoutRecord, ProfileUpdate, TaskRecord,
        UserProfile,
    },
};

/// The hosted auth + persistence collaborator. The coordination layer only
/// depends on this surface; records are owned by the service and cached
/// here for the session's duration.
#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> Result<UserProfile, AuthError>;
    /// Resolves a username to the email the auth service knows it by.
    async fn lookup_email(&self, username: &str) -> Result<Option<String>, PersistenceError>;
    async fn fetch_profile(&self, id: UserId) -> Result<UserProfile, PersistenceError>;
    /// Field-level merge; unset fields in `update` are left untouched.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError>;
    async fn fetch_notifications(
        &self,
        user: UserId,
    ) -> Result<Vec<NotificationRecord>, PersistenceError>;
    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), PersistenceError>;
    async fn insert_submission(&self, submission: &NewSubmission) -> Result<(), PersistenceError>;
    async fn fetch_users(&self) -> Result<Vec<UserProfile>, PersistenceError>;
    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, PersistenceError>;
    async fn fetch_meetings(&self) -> Result<Vec<MeetingRecord>, PersistenceError>;
    async fn fetch_payouts(&self) -> Result<Vec<PayoutRecord>, PersistenceError>;
}

fn unavailable() -> PersistenceError {
    PersistenceError::Network("workspace backend is unavailable".to_string())
}

/// Stand-in used before a real backend is wired up; every call fails.
pub struct MissingBackend;

#[async_trait]
impl WorkspaceBackend for MissingBackend {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<UserProfile, AuthError> {
        Err(AuthError::Backend(unavailable()))
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _username: &str,
        _role: Role,
    ) -> Result<UserProfile, AuthError> {
        Err(AuthError::Backend(unavailable()))
    }

    async fn lookup_email(&self, _username: &str) -> Result<Option<String>, PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_profile(&self, _id: UserId) -> Result<UserProfile, PersistenceError> {
        Err(unavailable())
    }

    async fn update_profile(
        &self,
        _id: UserId,
        _update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_notifications(
        &self,
        _user: UserId,
    ) -> Result<Vec<NotificationRecord>, PersistenceError> {
        Err(unavailable())
    }

    async fn mark_notification_read(&self, _id: NotificationId) -> Result<(), PersistenceError> {
        Err(unavailable())
    }

    async fn insert_submission(&self, _submission: &NewSubmission) -> Result<(), PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_users(&self) -> Result<Vec<UserProfile>, PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_meetings(&self) -> Result<Vec<MeetingRecord>, PersistenceError> {
        Err(unavailable())
    }

    async fn fetch_payouts(&self) -> Result<Vec<PayoutRecord>, PersistenceError> {
        Err(unavailable())
    }
}

/// Maps an auth endpoint's failure message onto the error taxonomy. The
/// hosted service reports failures as message text, so classification is
/// by phrase.
pub(crate) fn classify_auth_failure(message: &str) -> AuthError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("invalid login credentials") || lower.contains("invalid email or password") {
        AuthError::InvalidCredentials
    } else if lower.contains("not confirmed") {
        AuthError::UnconfirmedAccount
    } else if lower.contains("already registered") || lower.contains("already exists") {
        AuthError::AlreadyRegistered
    } else {
        AuthError::Backend(PersistenceError::Rejected(message.to_string()))
    }
}

fn network(err: reqwest::Error) -> PersistenceError {
    PersistenceError::Network(err.to_string())
}

#[derive(Deserialize)]
struct AuthUser {
    id: UserId,
}

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    user: AuthUser,
}

/// The sign-up endpoint returns a session when confirmation is disabled
/// and a bare user object when a confirmation email is pending.
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    id: Option<UserId>,
}

#[derive(Default, Deserialize)]
struct AuthFailureBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AuthFailureBody {
    fn into_message(self, fallback: String) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or(fallback)
    }
}

#[derive(Deserialize)]
struct EmailRow {
    email: String,
}

/// REST client for the hosted service: token grants under `/auth/v1`,
/// row access under `/rest/v1/<table>` with `eq.` filters and partial
/// PATCH updates.
pub struct RestBackend {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
            access_token: RwLock::new(None),
        }
    }

    fn rest(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.api_key.clone());
        builder.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, PersistenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            status.to_string()
        } else {
            body
        };
        if status.is_server_error() {
            Err(PersistenceError::Network(message))
        } else {
            Err(PersistenceError::Rejected(message))
        }
    }

    async fn auth_failure(response: Response) -> AuthError {
        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            return AuthError::Backend(PersistenceError::Network(message));
        }
        let message = match response.json::<AuthFailureBody>().await {
            Ok(body) => body.into_message(status.to_string()),
            Err(_) => status.to_string(),
        };
        classify_auth_failure(&message)
    }

    /// The profile row is normally provisioned by the service; upserting it
    /// here covers the window before the first approval pass sees it.
    async fn upsert_profile_row(&self, profile: &UserProfile) -> Result<(), PersistenceError> {
        let builder = self
            .http
            .post(self.rest("users"))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile);
        let response = self.authed(builder).await.send().await.map_err(network)?;
        Self::check(response).await.map(|_| ())
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, PersistenceError> {
        let builder = self.http.get(self.rest(table)).query(query);
        let response = self.authed(builder).await.send().await.map_err(network)?;
        Self::check(response).await?.json().await.map_err(network)
    }
}

#[async_trait]
impl WorkspaceBackend for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .http
            .post(format!("{}?grant_type=password", self.auth("token")))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| AuthError::Backend(network(err)))?;
        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|err| AuthError::Backend(network(err)))?;
        *self.access_token.write().await = Some(grant.access_token);

        let profile = self.fetch_profile(grant.user.id).await?;
        debug!(user_id = %profile.id, "authenticated against workspace backend");
        Ok(profile)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> Result<UserProfile, AuthError> {
        let response = self
            .http
            .post(self.auth("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "username": username, "role": role },
            }))
            .send()
            .await
            .map_err(|err| AuthError::Backend(network(err)))?;
        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }

        let created: SignUpResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Backend(network(err)))?;
        if let Some(token) = created.access_token {
            *self.access_token.write().await = Some(token);
        }
        let id = created
            .user
            .map(|user| user.id)
            .or(created.id)
            .ok_or_else(|| {
                AuthError::Backend(PersistenceError::Rejected(
                    "sign-up response carried no user id".to_string(),
                ))
            })?;

        let profile = UserProfile {
            id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            status: UserStatus::Pending,
            theme: None,
            color_theme: None,
            sound_enabled: None,
        };
        if let Err(err) = self.upsert_profile_row(&profile).await {
            debug!(error = %err, "profile row upsert after sign-up skipped");
        }
        Ok(profile)
    }

    async fn lookup_email(&self, username: &str) -> Result<Option<String>, PersistenceError> {
        let rows: Vec<EmailRow> = self
            .fetch_rows(
                "users",
                &[
                    ("username", format!("eq.{username}")),
                    ("select", "email".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.email))
    }

    async fn fetch_profile(&self, id: UserId) -> Result<UserProfile, PersistenceError> {
        let rows: Vec<UserProfile> = self
            .fetch_rows(
                "users",
                &[("id", format!("eq.{id}")), ("select", "*".to_string())],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PersistenceError::Rejected(format!("no profile row for user {id}")))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        if update.is_empty() {
            return Ok(());
        }
        let builder = self
            .http
            .patch(self.rest("users"))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(update);
        let response = self.authed(builder).await.send().await.map_err(network)?;
        Self::check(response).await.map(|_| ())
    }

    async fn fetch_notifications(
        &self,
        user: UserId,
    ) -> Result<Vec<NotificationRecord>, PersistenceError> {
        self.fetch_rows(
            "notifications",
            &[
                ("user_id", format!("eq.{user}")),
                ("order", "created_at.asc".to_string()),
                ("select", "*".to_string()),
            ],
        )
        .await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), PersistenceError> {
        let builder = self
            .http
            .patch(self.rest("notifications"))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "read": true }));
        let response = self.authed(builder).await.send().await.map_err(network)?;
        Self::check(response).await.map(|_| ())
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<(), PersistenceError> {
        let builder = self
            .http
            .post(self.rest("user_submissions"))
            .header("Prefer", "return=minimal")
            .json(submission);
        let response = self.authed(builder).await.send().await.map_err(network)?;
        Self::check(response).await.map(|_| ())
    }

    async fn fetch_users(&self) -> Result<Vec<UserProfile>, PersistenceError> {
        self.fetch_rows("users", &[("select", "*".to_string())])
            .await
    }

    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, PersistenceError> {
        self.fetch_rows("tasks", &[("select", "*".to_string())])
            .await
    }

    async fn fetch_meetings(&self) -> Result<Vec<MeetingRecord>, PersistenceError> {
        self.fetch_rows(
            "meetings",
            &[
                ("order", "scheduled_at.asc".to_string()),
                ("select", "*".to_string()),
            ],
        )
        .await
    }

    async fn fetch_payouts(&self) -> Result<Vec<PayoutRecord>, PersistenceError> {
        self.fetch_rows("payouts", &[("select", "*".to_string())])
            .await
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
