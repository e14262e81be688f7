//! Pairing routes: one-time code issue and verification, WebSocket tickets.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::debug;

use super::http_layers::limit_per_minute;
use super::session::COOKIE_SESSION_TOKEN_KEY;
use super::state::{GuardedPairingManager, ServerState};
use crate::pairing::Session;

pub const LOGIN_ERROR_LOCATION: &str = "/index.html#/login/error";

#[derive(Debug, Default, Deserialize)]
pub struct CodeForm {
    pub challenge: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyCodeForm {
    pub code: Option<String>,
}

/// A body that cannot be read as a form counts as no parameters.
fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(value)) => value,
        Err(rejection) => {
            debug!("Ignoring unreadable form: {}", rejection);
            T::default()
        }
    }
}

async fn post_code(
    State(pairing): State<GuardedPairingManager>,
    form: Result<Form<CodeForm>, FormRejection>,
) -> Response {
    let form = form_or_default(form);
    let previous = form.challenge.filter(|c| !c.trim().is_empty());
    let challenge = pairing.issue_challenge(previous.as_deref());
    challenge.challenge_token.into_response()
}

async fn post_verify_code(
    State(state): State<ServerState>,
    jar: CookieJar,
    form: Result<Form<VerifyCodeForm>, FormRejection>,
) -> Response {
    let Some(code) = form_or_default(form).code else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state.pairing.verify_code(code.trim()) {
        Ok(Session { token: Some(token) }) => {
            let max_age = time::Duration::seconds(
                state.config.session_cookie_max_age.as_secs() as i64,
            );
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(max_age);
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Ok(Session { token: None }) => Redirect::to("/").into_response(),
        Err(_) => Redirect::to(LOGIN_ERROR_LOCATION).into_response(),
    }
}

async fn get_ws_ticket(session: Session, State(pairing): State<GuardedPairingManager>) -> Response {
    pairing.issue_ws_ticket(&session).into_response()
}

pub fn make_pairing_routes(state: ServerState) -> Router {
    let code_routes = Router::new()
        .route("/code", post(post_code))
        .route("/verify-code", post(post_verify_code))
        .with_state(state.clone());
    let code_routes = limit_per_minute(code_routes, state.config.pairing_attempts_per_minute);

    Router::new()
        .route("/wsticket", get(get_ws_ticket))
        .with_state(state)
        .merge(code_routes)
}
