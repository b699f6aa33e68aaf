use chess::{Board, Color};
use log::debug;

use crate::error::{SessionError, SessionResult};
use crate::game::utils::{color_to_string, is_legal, parse_uci};

/// Where the player is looking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// The most recent authoritative position
    Live,
    /// The position after the first `n` plies, `1 <= n < len`
    At(usize),
}

/// A navigation request from the rendering side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Back,
    Forward,
    Live,
    To(usize),
}

/// Position to render for the current cursor
#[derive(Clone, PartialEq)]
pub struct Projection {
    pub board: Board,
    pub cursor: Cursor,
    /// The ply that led to `board`, if any
    pub last_move: Option<String>,
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("fen", &self.board.to_string())
            .field("cursor", &self.cursor)
            .field("last_move", &self.last_move)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MoveHistory {
    moves: Vec<String>,
    cursor: Cursor,
}

impl Default for MoveHistory {
    fn default() -> Self {
        MoveHistory::new()
    }
}

impl MoveHistory {
    pub fn new() -> Self {
        MoveHistory {
            moves: Vec::new(),
            cursor: Cursor::Live,
        }
    }

    /// Replace the whole list and return to the live position.
    pub fn set_history(&mut self, moves: Vec<String>) {
        self.moves = moves;
        self.cursor = Cursor::Live;
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_live(&self) -> bool {
        self.cursor == Cursor::Live
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    /// Project the position after `index` plies.
    ///
    /// The index is clamped to `[1, len]`; reaching `len` means the live
    /// position, which is taken from `live` rather than replayed.
    pub fn go_to(&mut self, index: usize, live: &Board) -> SessionResult<Projection> {
        let len = self.moves.len();
        let index = index.clamp(1, len.max(1));
        if index >= len {
            return Ok(self.to_live(live));
        }

        let board = replay(&self.moves[..index])?;
        self.cursor = Cursor::At(index);
        debug!("Viewing position after ply {} of {}", index, len);
        Ok(Projection {
            board,
            cursor: self.cursor,
            last_move: Some(self.moves[index - 1].clone()),
        })
    }

    pub fn to_live(&mut self, live: &Board) -> Projection {
        self.cursor = Cursor::Live;
        Projection {
            board: *live,
            cursor: Cursor::Live,
            last_move: self.moves.last().cloned(),
        }
    }

    pub fn navigate(&mut self, navigation: Navigation, live: &Board) -> SessionResult<Projection> {
        match (navigation, self.cursor) {
            (Navigation::Live, _) | (Navigation::Forward, Cursor::Live) => Ok(self.to_live(live)),
            (Navigation::First, _) => self.go_to(1, live),
            (Navigation::To(index), _) => self.go_to(index, live),
            (Navigation::Back, Cursor::Live) => self.go_to(self.moves.len().saturating_sub(1), live),
            (Navigation::Back, Cursor::At(index)) => self.go_to(index.saturating_sub(1), live),
            (Navigation::Forward, Cursor::At(index)) => self.go_to(index + 1, live),
        }
    }

    /// Numbered rows for display, e.g. `1. White: e2e4`
    pub fn rows(&self) -> Vec<String> {
        self.moves
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let color = if index % 2 == 0 { Color::White } else { Color::Black };
                format!("{}. {}: {}", index / 2 + 1, color_to_string(color), text)
            })
            .collect()
    }
}

/// Replay coordinate moves from the initial position into a scratch board.
pub fn replay(moves: &[String]) -> SessionResult<Board> {
    let mut board = Board::default();
    for text in moves {
        let chess_move = parse_uci(text)
            .filter(|&m| is_legal(&board, m))
            .ok_or_else(|| SessionError::CorruptHistory(text.clone()))?;
        board = board.make_move_new(chess_move);
    }
    Ok(board)
}
