use super::state::ServerState;
use crate::pairing::Session;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

pub const COOKIE_SESSION_TOKEN_KEY: &str = "user_session";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    Unauthorized,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .map(|v| v.trim_start_matches("Bearer ").to_string())
}

fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    if ctx.config.bypass_auth {
        return Some(Session { token: None });
    }
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No session token in cookies nor headers.");
            return None;
        }
        Some(x) => x,
    };

    if !ctx.pairing.is_session_valid(&token) {
        debug!("Unknown or expired session token");
        return None;
    }
    Some(Session { token: Some(token) })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).ok_or(SessionExtractionError::Unauthorized)
    }
}

impl axum::extract::OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx))
    }
}

/// Routes of a disabled feature family answer 403.
pub fn ensure_feature(enabled: bool) -> Result<(), StatusCode> {
    if enabled {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}
