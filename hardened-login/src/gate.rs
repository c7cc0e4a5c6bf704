//! Session-gated access control.
//!
//! A session moves from anonymous to authenticated only through a successful
//! [`AccessGate::attempt_login`]. There is no way back; logout is not offered.
//! A failed login is an ordinary redirect, not an error.

use std::sync::Arc;

use crate::auth::CredentialVerifier;
use crate::session::Session;

/// Session attribute set once the credential check has passed.
pub const USER_ATTRIBUTE: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Home,
    Login,
}

impl RedirectTarget {
    pub fn location(self) -> &'static str {
        match self {
            RedirectTarget::Home => "/index.html",
            RedirectTarget::Login => "/login",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeOutcome {
    Redirect(RedirectTarget),
    Home(HomeView),
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    verifier: Arc<dyn CredentialVerifier>,
}

impl AccessGate {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    pub fn render_login_form(&self) -> LoginView {
        LoginView
    }

    pub fn attempt_login(
        &self,
        username: &str,
        password: &str,
        session: &Session,
    ) -> RedirectTarget {
        let verified = self.verifier.verify(username, password);
        if verified && session.insert(USER_ATTRIBUTE, username) {
            RedirectTarget::Home
        } else {
            RedirectTarget::Login
        }
    }

    pub fn render_home(&self, session: &Session) -> HomeOutcome {
        match session.get(USER_ATTRIBUTE) {
            Some(user) => HomeOutcome::Home(HomeView { user }),
            None => HomeOutcome::Redirect(RedirectTarget::Login),
        }
    }

    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }
}
