use axum::extract::State;
use axum::http::header::HeaderName;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::gate::{HomeOutcome, LoginView, RedirectTarget};
use crate::session::Session;

use super::error::ApiError;
use super::responses::{HealthResponse, LoginForm};
use super::security::harden_response;
use super::sessions::attach_session;
use super::state::AppState;

/// Builds the application. Middleware runs top to bottom on the way in:
/// response hardening first, so every response (404s and middleware
/// rejections included) leaves with the security policy applied. Only the
/// page routes carry a session; `/health` and the fallback do not.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    let pages = Router::new()
        .route("/", get(home))
        .route("/index.html", get(home))
        .route("/login", get(login_form))
        .route("/doLogin", post(do_login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            attach_session,
        ));

    Router::new()
        .merge(pages)
        .route("/health", get(health))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(harden_response))
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::new(
                    request_id.clone(),
                    MakeRequestUuid::default(),
                ))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.count(),
    })
}

async fn login_form(State(state): State<AppState>) -> LoginView {
    debug!("login form requested");
    state.gate.render_login_form()
}

async fn do_login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> RedirectTarget {
    state
        .gate
        .attempt_login(&form.username, &form.password, &session)
}

async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    let outcome = state.gate.render_home(&session);
    match &outcome {
        HomeOutcome::Home(view) => debug!(user = %view.user, "home page served"),
        HomeOutcome::Redirect(_) => debug!("anonymous session sent to login"),
    }
    outcome
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
