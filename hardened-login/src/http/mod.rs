//! HTTP layer: Axum router, middleware, handlers and views.
//!
//! Exposes the login form (`/login`), the credential check (`/doLogin`)
//! and the session-gated home page (`/`, `/index.html`).

mod error;
mod handlers;
mod responses;
mod security;
mod sessions;
mod state;
mod views;


pub use handlers::router;
pub use state::AppState;
