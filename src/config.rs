use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::game::TimeControl;

/// AI strength requested from the authority
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Client-side session controller for games against a remote chess authority", long_about = None)]
pub struct Config {
    /// Base URL of the remote authority
    #[arg(long, env = "CHESS_AUTHORITY_URL", default_value = "http://127.0.0.1:5000")]
    pub authority_url: String,

    /// Host the rendering bridge listens on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port the rendering bridge listens on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Directory holding the persisted client state
    #[arg(long, default_value = ".chess-client")]
    pub state_dir: PathBuf,

    /// AI strength for new games
    #[arg(long, value_enum, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Clock tier: blitz, rapid or classical (anything else is blitz)
    #[arg(long, default_value = "blitz")]
    pub time_control: String,

    /// Where the renderer is sent when there is no valid session
    #[arg(long, default_value = "/login")]
    pub login_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// Store this username as the signed-in identity before starting
    #[arg(long)]
    pub sign_in: Option<String>,
}

impl Config {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            difficulty: self.difficulty,
            time_control: TimeControl::from_tier(&self.time_control),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Per-session preferences that travel with every new game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSettings {
    pub difficulty: Difficulty,
    pub time_control: TimeControl,
}
