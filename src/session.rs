//! Server-side cookie sessions.
//!
//! The client holds an opaque random token; the server keeps only its
//! SHA-256 digest mapped to the user id and an expiry.

use std::collections::HashMap;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use chrono::{DateTime, Duration, Utc};
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::state::AppState;

const TOKEN_LEN: usize = 64;

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    ttl: Duration,
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a session and returns the raw token for the cookie.
    pub async fn create(&self, user_id: &str) -> String {
        let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LEN);
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            hash_token(&token),
            SessionRecord {
                user_id: user_id.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// The user id behind a live token. Expired sessions are dropped.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        let key = hash_token(token);
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                Some(s) if s.expires_at > Utc::now() => return Some(s.user_id.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().await.remove(&key);
        None
    }

    pub async fn destroy(&self, token: &str) {
        self.sessions.write().await.remove(&hash_token(token));
    }
}

/// Reads the named cookie from the request headers.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(name: &str, token: &str, ttl: Duration, secure: bool) -> HeaderValue {
    let mut cookie = format!(
        "{name}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn clear_cookie(name: &str, secure: bool) -> HeaderValue {
    let mut cookie = format!("{name}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// An authenticated request. Rejects with 401 when there is no live session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthenticated = || AppError::Unauthenticated("Not authenticated".to_string());

        let token = token_from_headers(&parts.headers, &state.config.session_cookie_name)
            .ok_or_else(unauthenticated)?;
        let user_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(unauthenticated)?;

        Ok(AuthUser { user_id, token })
    }
}
