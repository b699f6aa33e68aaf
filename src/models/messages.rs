use actix::{Message, Recipient};
use chess::{Color, Piece, Square};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Difficulty;
use crate::game::{Navigation, TimeControl};
use crate::models::api::SavedGame;

/// Message sent from the renderer to the bridge
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClientMessage {
    pub message_type: String,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    pub square: Option<String>,
    pub promote_to: Option<String>,
    /// `first`, `back`, `forward`, `live`, or `to` together with `index`
    pub navigate: Option<String>,
    pub index: Option<usize>,
    pub color_preference: Option<String>,
    pub difficulty: Option<String>,
    pub time_control: Option<String>,
    pub game_id: Option<String>,
}

/// Render view pushed to the renderer
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub message_type: String,
    pub game_id: Option<String>,
    /// Position to display; a past position while navigating history
    pub fen: Option<String>,
    pub live: bool,
    pub cursor: Option<usize>,
    pub orientation: Option<String>,
    pub status: Option<String>,
    pub history: Vec<String>,
    pub white_seconds: Option<u32>,
    pub black_seconds: Option<u32>,
    pub active_color: Option<String>,
    pub probability: Option<f64>,
    pub hint: Option<String>,
    pub selected: Option<String>,
    pub available_moves: Option<Vec<String>>,
    pub promotion_pending: Option<LastMove>,
    pub last_move: Option<LastMove>,
    /// The authority's answer to the player's last move
    pub reply_move: Option<String>,
    pub busy: bool,
    pub input_enabled: bool,
    pub dark_mode: bool,
    pub games: Option<Vec<SavedGame>>,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub redirect: Option<String>,
}

impl ServerMessage {
    pub fn error(text: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "error".to_string(),
            error: Some(text.into()),
            ..ServerMessage::default()
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "redirect".to_string(),
            redirect: Some(url.into()),
            ..ServerMessage::default()
        }
    }
}

/// Source and target squares of a move
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
}

impl LastMove {
    pub fn from_uci(text: &str) -> Option<Self> {
        let text = text.get(0..4).filter(|t| t.is_ascii())?;
        Some(LastMove {
            from: text[0..2].to_string(),
            to: text[2..4].to_string(),
        })
    }
}

/// Serialized message on its way to one WebSocket connection
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);

/// User intent forwarded from a connection to the session actor
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum Command {
    Move { from: Square, to: Square },
    Select(Square),
    Promote(Piece),
    CancelPromotion,
    Navigate(Navigation),
    NewGame {
        color: Option<Color>,
        difficulty: Option<Difficulty>,
        time_control: Option<TimeControl>,
    },
    Resume(String),
    Save,
    ListGames,
    Hint,
    Logout,
    ToggleDarkMode,
    Sync,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: Uuid,
    pub addr: Recipient<ChessWebSocketMessage>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

/// Ask the session actor for the view it would render right now
#[derive(Message)]
#[rtype(result = "ServerMessage")]
pub struct CurrentView;
