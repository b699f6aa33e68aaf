pub mod http;

use async_trait::async_trait;

use crate::error::AuthorityError;
use crate::models::api::{MoveRequest, SavedGame, StateResponse};
use crate::session::identity::Identity;

pub use http::HttpAuthority;

#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    async fn fetch_state(&self, identity: &Identity) -> Result<StateResponse, AuthorityError>;

    /// Submit a move, or the reset marker, for the current game.
    async fn submit_move(
        &self,
        identity: &Identity,
        request: &MoveRequest,
    ) -> Result<StateResponse, AuthorityError>;

    /// A suggested move in coordinate form, `None` when there is no hint.
    async fn hint(&self, identity: &Identity) -> Result<Option<String>, AuthorityError>;

    /// Persist the current game and return its id.
    async fn save(&self, identity: &Identity) -> Result<String, AuthorityError>;

    async fn list_games(&self, identity: &Identity) -> Result<Vec<SavedGame>, AuthorityError>;

    async fn resume(&self, identity: &Identity, game_id: &str) -> Result<StateResponse, AuthorityError>;

    async fn logout(&self, identity: &Identity) -> Result<(), AuthorityError>;
}

/// One request to the authority, as issued by the session
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityCall {
    FetchState,
    SubmitMove(MoveRequest),
    Hint,
    Save,
    ListGames,
    Resume(String),
    Logout,
}

impl AuthorityCall {
    pub fn name(&self) -> &'static str {
        match self {
            AuthorityCall::FetchState => "fetch_state",
            AuthorityCall::SubmitMove(request) if request.is_reset() => "reset",
            AuthorityCall::SubmitMove(_) => "submit_move",
            AuthorityCall::Hint => "hint",
            AuthorityCall::Save => "save",
            AuthorityCall::ListGames => "list_games",
            AuthorityCall::Resume(_) => "resume",
            AuthorityCall::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityReply {
    State(StateResponse),
    Hint(Option<String>),
    Saved(String),
    Games(Vec<SavedGame>),
    LoggedOut,
}

/// Route a call to the matching authority operation
pub async fn dispatch(
    authority: &dyn RemoteAuthority,
    identity: &Identity,
    call: AuthorityCall,
) -> Result<AuthorityReply, AuthorityError> {
    match call {
        AuthorityCall::FetchState => authority.fetch_state(identity).await.map(AuthorityReply::State),
        AuthorityCall::SubmitMove(request) => authority
            .submit_move(identity, &request)
            .await
            .map(AuthorityReply::State),
        AuthorityCall::Hint => authority.hint(identity).await.map(AuthorityReply::Hint),
        AuthorityCall::Save => authority.save(identity).await.map(AuthorityReply::Saved),
        AuthorityCall::ListGames => authority.list_games(identity).await.map(AuthorityReply::Games),
        AuthorityCall::Resume(game_id) => authority
            .resume(identity, &game_id)
            .await
            .map(AuthorityReply::State),
        AuthorityCall::Logout => authority.logout(identity).await.map(|()| AuthorityReply::LoggedOut),
    }
}
