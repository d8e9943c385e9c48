use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::profile::sanitize_bio;
use crate::db::models::{NewProfile, NewUser, User};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{ProfileStore, StoreError, UserStore};

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,50}$").unwrap();
}

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { users, profiles }
    }

    /// Creates the user and its profile, sharing one id.
    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        Validator::new()
            .require("username", &input.username)
            .check(
                input.username.is_empty() || USERNAME_RE.is_match(&input.username),
                "username",
                "username must be 3-50 letters, digits, '_', '.' or '-'",
            )
            .require("password", &input.password)
            .require("displayName", &input.display_name)
            .max_len("displayName", &input.display_name, 100)
            .finish()?;

        if self
            .users
            .get_user_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        // bcrypt is CPU-bound; keep it off the async workers.
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
            .await
            .map_err(|e| AppError::Unexpected(format!("hash task failed: {e}")))?
            .map_err(|e| AppError::Unexpected(format!("password hashing failed: {e}")))?;

        let user = self
            .users
            .create_user(NewUser {
                username: input.username.clone(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::Conflict("Username already taken".to_string()),
                other => other.into(),
            })?;

        self.profiles
            .create_profile(NewProfile {
                user_id: user.id.clone(),
                username: input.username,
                display_name: input.display_name.trim().to_string(),
                bio: input.bio.as_deref().map(sanitize_bio),
                avatar: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> AppResult<User> {
        Validator::new()
            .require("username", &input.username)
            .require("password", &input.password)
            .finish()?;

        let Some(user) = self.users.get_user_by_username(&input.username).await? else {
            tracing::warn!("login attempt for unknown user");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        let password = input.password;
        let stored = user.password_hash.clone();
        let password_ok = tokio::task::spawn_blocking(move || verify(password, &stored))
            .await
            .map_err(|e| AppError::Unexpected(format!("verify task failed: {e}")))?
            .unwrap_or_else(|e| {
                tracing::warn!("stored password hash is unreadable: {e}");
                false
            });

        if !password_ok {
            tracing::warn!(user_id = %user.id, "login failed: bad password");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    pub async fn current_user(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.get_user(user_id).await?)
    }
}
