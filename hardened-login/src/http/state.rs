use crate::gate::AccessGate;
use crate::session::SessionStore;

#[derive(Debug, Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub sessions: SessionStore,
}
