use actix::Addr;

use crate::session::SessionActor;

/// Application state shared by the HTTP handlers
pub struct AppState {
    pub session: Addr<SessionActor>,
}
