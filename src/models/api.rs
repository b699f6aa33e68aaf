use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker sent in place of a move to start a fresh game.
pub const RESET_MARKER: &str = "reset";

/// Body of `POST /move`, used both for real moves and for the reset marker
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub move_str: String,
    pub difficulty: String,
    pub player_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

impl MoveRequest {
    pub fn is_reset(&self) -> bool {
        self.move_str == RESET_MARKER
    }
}

/// Authoritative state, returned by fetch, move, reset and resume.
///
/// A body carrying `error` is an application-level rejection even when the
/// HTTP status was 200.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StateResponse {
    #[serde(default)]
    pub fen: Option<String>,
    /// The authority's reply move, if it made one.
    #[serde(rename = "move", default)]
    pub reply_move: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub player_color: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    /// "1-0", "0-1" or "1/2-1/2" once the game is over
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HintResponse {
    #[serde(rename = "move", default)]
    pub suggestion: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveResponse {
    pub game_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedGame {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SavedGamesResponse {
    #[serde(default)]
    pub games: Vec<SavedGame>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResumeRequest {
    pub game_id: String,
}

/// Error body the authority attaches to non-2xx responses
#[derive(Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: String,
}
