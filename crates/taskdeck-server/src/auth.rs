//! Credential service and request authentication.
//!
//! Passwords are hashed with bcrypt (tunable cost). Sessions are signed
//! HS256 tokens carrying the user's identity and role, valid for 30
//! days; there is no revocation list, expiry is the only invalidation.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use taskdeck_core::actor::Actor;
use taskdeck_core::user::Role;

use crate::routes::AppState;

pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,

    #[error("credential error: {0}")]
    Internal(String),
}

/// Signing and verification keys derived from the server-held secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn issue_token(keys: &TokenKeys, user_id: &str, role: Role) -> Result<String, AuthError> {
    issue_token_with_ttl(keys, user_id, role, Duration::days(TOKEN_TTL_DAYS))
}

fn issue_token_with_ttl(
    keys: &TokenKeys,
    user_id: &str,
    role: Role,
    ttl: Duration,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| AuthError::Internal(e.to_string()))
}

/// Verify signature and expiry, yielding the request's actor. Malformed,
/// tampered and expired tokens all answer the same `InvalidToken`.
pub fn resolve_token(keys: &TokenKeys, token: &str) -> Result<Actor, AuthError> {
    let data = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(Actor::new(data.claims.sub, data.claims.role))
}

/// Pull the bearer token off a request. Document view/download links are
/// opened directly by the browser, which cannot set headers, so a
/// `token` query parameter is accepted as a fallback.
fn extract_token(request: &Request) -> Option<&str> {
    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    header.or_else(|| request.uri().query().and_then(query_token))
}

fn query_token(query: &str) -> Option<&str> {
    query.split('&').find_map(|pair| pair.strip_prefix("token="))
}

/// Axum middleware guarding every protected route: resolves the token
/// to an [`Actor`] and injects it as a request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(&request) {
        Some(token) => token.to_string(),
        None => return unauthorized(),
    };
    match resolve_token(&state.keys, &token) {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(_) => unauthorized(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "missing or invalid token" })),
    )
        .into_response()
}
