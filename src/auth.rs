//! Session authentication.
//!
//! A login mints an opaque random token. Only its SHA-256 digest is stored, so a
//! leaked `sessions` table cannot be replayed. [`require_session`] resolves the
//! token on every protected request and hands handlers an [`AuthUser`].

use anyhow::Context;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app_error::AppError,
    app_state::AppState,
    models::{CreateSessionEntity, UserEntity},
    schema::{sessions, users},
};

pub const SESSION_COOKIE: &str = "sid";

const TOKEN_LENGTH: usize = 48;

/// The authenticated principal for one request.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<&UserEntity> for AuthUser {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Pulls the session token from `Authorization: Bearer` or the `sid` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl_hours * 3600
    )
}

/// Deletes every session past its expiry. Returns how many were removed.
pub async fn purge_expired_sessions(conn: &mut AsyncPgConnection) -> Result<usize, AppError> {
    let purged = diesel::delete(sessions::table.filter(sessions::expires_at.le(Utc::now())))
        .execute(conn)
        .await
        .context("Failed to purge expired sessions")?;

    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }

    Ok(purged)
}

/// Opens a session for `user_id` and returns the raw token to give to the client.
/// Expired sessions are swept first.
pub async fn create_session(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    ttl_hours: i64,
) -> Result<String, AppError> {
    purge_expired_sessions(conn).await?;

    let token = generate_token();

    diesel::insert_into(sessions::table)
        .values(CreateSessionEntity {
            token_hash: hash_token(&token),
            user_id,
            expires_at: Utc::now() + Duration::hours(ttl_hours),
        })
        .execute(conn)
        .await
        .context("Failed to create session")?;

    Ok(token)
}

pub async fn delete_session(conn: &mut AsyncPgConnection, token: &str) -> Result<(), AppError> {
    diesel::delete(sessions::table.find(hash_token(token)))
        .execute(conn)
        .await
        .context("Failed to delete session")?;
    Ok(())
}

/// Looks up the user behind a live session. Expired sessions resolve to `None`.
pub async fn resolve_session(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> Result<Option<UserEntity>, AppError> {
    let user = sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(hash_token(token)))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(UserEntity::as_select())
        .first(conn)
        .await;

    match user {
        Ok(user) => Ok(Some(user)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Rejects requests without a live session and attaches the [`AuthUser`]
/// extension for handlers further down.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;

    let user = {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        resolve_session(conn, &token).await?
    };

    let user = user.ok_or_else(|| AppError::Unauthorized("Session expired or invalid".into()))?;

    req.extensions_mut().insert(AuthUser::from(&user));
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

/// Raw token of the current request's session, for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("maize-secret").unwrap();
        assert!(verify_password("maize-secret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("maize-secret", "not-a-phc-string"));
    }

    #[test]
    fn tokens_are_random_and_hash_stably() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert_ne!(a, b);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_eq!(hash_token(&a).len(), 64);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("sid=def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sid=xyz; lang=en"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("sid="));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn cookie_carries_max_age() {
        assert_eq!(
            session_cookie("tok", 2),
            "sid=tok; HttpOnly; Path=/; SameSite=Lax; Max-Age=7200"
        );
    }
}
