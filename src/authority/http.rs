use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::RemoteAuthority;
use crate::error::AuthorityError;
use crate::models::api::{
    ErrorBody, HintResponse, MoveRequest, ResumeRequest, SaveResponse, SavedGame, SavedGamesResponse,
    StateResponse,
};
use crate::session::identity::Identity;

/// Remote authority reached over HTTP/JSON.
///
/// The identity travels as a bearer token; a 401 from any endpoint is the
/// unauthenticated signal.
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::Transport(e.to_string()))?;
        Ok(HttpAuthority {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, identity: &Identity, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&identity.username)
    }

    fn post(&self, identity: &Identity, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&identity.username)
    }

    /// Send and return the body of a successful response
    async fn send_raw(request: RequestBuilder) -> Result<String, AuthorityError> {
        let response = request.send().await.map_err(|e| {
            warn!("Request to authority failed: {}", e);
            AuthorityError::Transport(e.to_string())
        })?;
        let status = response.status();
        debug!("Authority answered {} for {}", status, response.url());

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthorityError::Unauthenticated);
        }
        let body = response
            .text()
            .await
            .map_err(|e| AuthorityError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => AuthorityError::Rejected(error),
                Err(_) => AuthorityError::Transport(format!("authority returned {}", status)),
            });
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AuthorityError> {
        let body = Self::send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| AuthorityError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_state(&self, identity: &Identity) -> Result<StateResponse, AuthorityError> {
        Self::send(self.get(identity, "/fen")).await
    }

    async fn submit_move(
        &self,
        identity: &Identity,
        request: &MoveRequest,
    ) -> Result<StateResponse, AuthorityError> {
        Self::send(self.post(identity, "/move").json(request)).await
    }

    async fn hint(&self, identity: &Identity) -> Result<Option<String>, AuthorityError> {
        let response: HintResponse = Self::send(self.get(identity, "/hint")).await?;
        Ok(response.suggestion)
    }

    async fn save(&self, identity: &Identity) -> Result<String, AuthorityError> {
        let response: SaveResponse = Self::send(self.post(identity, "/save")).await?;
        Ok(response.game_id)
    }

    async fn list_games(&self, identity: &Identity) -> Result<Vec<SavedGame>, AuthorityError> {
        let response: SavedGamesResponse = Self::send(self.get(identity, "/games")).await?;
        Ok(response.games)
    }

    async fn resume(&self, identity: &Identity, game_id: &str) -> Result<StateResponse, AuthorityError> {
        let body = ResumeRequest {
            game_id: game_id.to_string(),
        };
        Self::send(self.post(identity, "/resume").json(&body)).await
    }

    async fn logout(&self, identity: &Identity) -> Result<(), AuthorityError> {
        Self::send_raw(self.post(identity, "/logout")).await.map(|_| ())
    }
}
