use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};
use tracing::debug;

use super::error::ApiError;
use super::state::AppState;

pub const SESSION_COOKIE: &str = "SESSIONID";

/// Loads the caller's session from its cookie, or starts a new one, and hands
/// it to handlers as a `Session` extension.
pub async fn attach_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.load(cookie.value()));
    let created = existing.is_none();
    let session = match existing {
        Some(session) => session,
        None => {
            let session = state.sessions.create();
            debug!(session = session.id(), "session created");
            session
        }
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if created {
        let cookie = session_cookie(session.id());
        let value = HeaderValue::from_str(&cookie.to_string()).map_err(|_| ApiError::Internal)?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_owned()))
        .http_only(true)
        .secure(true)
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}
