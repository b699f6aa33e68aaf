use actix_web_actors::ws;
use chess::Square;
use log::{info, warn};
use std::str::FromStr;

use crate::config::Difficulty;
use crate::game::utils::{parse_color, parse_piece};
use crate::game::{Navigation, TimeControl};
use crate::models::messages::{ClientMessage, Command};
use crate::websocket::handler::ChessWebSocket;

fn parse_square(field: &str, value: Option<&str>) -> Result<Square, String> {
    let value = value.ok_or_else(|| format!("Missing {}", field))?;
    Square::from_str(&value.trim().to_lowercase()).map_err(|_| format!("Invalid square for {}: {}", field, value))
}

fn parse_navigation(msg: &ClientMessage) -> Result<Navigation, String> {
    let direction = msg.navigate.as_deref().unwrap_or("to");
    match direction.to_ascii_lowercase().as_str() {
        "first" => Ok(Navigation::First),
        "back" => Ok(Navigation::Back),
        "forward" => Ok(Navigation::Forward),
        "live" => Ok(Navigation::Live),
        "to" => msg
            .index
            .map(Navigation::To)
            .ok_or_else(|| "Navigation to a ply requires an index".to_string()),
        other => Err(format!("Unknown navigation: {}", other)),
    }
}

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let command = match msg.message_type.as_str() {
            "move" => self.handle_move(&msg),
            "select" => parse_square("square", msg.square.as_deref()).map(Command::Select),
            "promote" => self.handle_promote(&msg),
            "cancel_promotion" => Ok(Command::CancelPromotion),
            "navigate" => parse_navigation(&msg).map(Command::Navigate),
            "new_game" => self.handle_new_game(&msg),
            "resume" => msg
                .game_id
                .clone()
                .filter(|id| !id.is_empty())
                .map(Command::Resume)
                .ok_or_else(|| "Resume requires a game_id".to_string()),
            "save" => Ok(Command::Save),
            "list_games" => Ok(Command::ListGames),
            "hint" => Ok(Command::Hint),
            "logout" => Ok(Command::Logout),
            "toggle_dark_mode" => Ok(Command::ToggleDarkMode),
            "sync" => Ok(Command::Sync),
            other => Err(format!("Unknown message type: {}", other)),
        };

        match command {
            Ok(command) => {
                info!("Forwarding {:?} from {}", command, self.id);
                self.session.do_send(command);
            }
            Err(e) => {
                warn!("Rejected message from {}: {}", self.id, e);
                self.send_error(e, ctx);
            }
        }
    }

    fn handle_move(&self, msg: &ClientMessage) -> Result<Command, String> {
        let from = parse_square("move_from", msg.move_from.as_deref())?;
        let to = parse_square("move_to", msg.move_to.as_deref())?;
        Ok(Command::Move { from, to })
    }

    fn handle_promote(&self, msg: &ClientMessage) -> Result<Command, String> {
        let name = msg
            .promote_to
            .as_deref()
            .ok_or_else(|| "Promotion requires promote_to".to_string())?;
        parse_piece(name)
            .map(Command::Promote)
            .ok_or_else(|| format!("Cannot promote to {}", name))
    }

    fn handle_new_game(&self, msg: &ClientMessage) -> Result<Command, String> {
        let color = match msg.color_preference.as_deref() {
            Some(name) => Some(parse_color(name).ok_or_else(|| format!("Unknown color: {}", name))?),
            None => None,
        };
        let difficulty = match msg.difficulty.as_deref() {
            Some(name) => Some(Difficulty::parse(name).ok_or_else(|| format!("Unknown difficulty: {}", name))?),
            None => None,
        };
        Ok(Command::NewGame {
            color,
            difficulty,
            time_control: msg.time_control.as_deref().map(TimeControl::from_tier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(message_type: &str) -> ClientMessage {
        ClientMessage {
            message_type: message_type.to_string(),
            ..ClientMessage::default()
        }
    }

    #[test]
    fn test_parse_square() {
        assert_eq!(parse_square("square", Some("E2")), Ok(Square::E2));
        assert!(parse_square("square", Some("z9")).is_err());
        assert_eq!(parse_square("move_to", None), Err("Missing move_to".to_string()));
    }

    #[test]
    fn test_parse_navigation() {
        let mut msg = message("navigate");
        msg.navigate = Some("back".to_string());
        assert_eq!(parse_navigation(&msg), Ok(Navigation::Back));

        msg.navigate = None;
        msg.index = Some(3);
        assert_eq!(parse_navigation(&msg), Ok(Navigation::To(3)));

        msg.index = None;
        assert!(parse_navigation(&msg).is_err());
    }
}
