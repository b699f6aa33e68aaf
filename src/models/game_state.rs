use chess::{Board, ChessMove, Color, Piece, Square};
use std::fmt;

/// Board-based termination, as computed by the local rules mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    None,
    Checkmate,
    Stalemate,
    DrawByRepetition,
    DrawByMaterial,
    DrawOther,
}

impl TerminalStatus {
    pub fn is_over(self) -> bool {
        self != TerminalStatus::None
    }
}

/// Game state owned by the session.
///
/// The side to move is never stored separately; it is always read from the
/// board so the two cannot disagree.
#[derive(Clone, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub terminal: TerminalStatus,
    pub game_id: Option<String>,
    pub player_color: Color,
}

impl GameState {
    pub fn new(player_color: Color) -> Self {
        GameState {
            board: Board::default(),
            terminal: TerminalStatus::None,
            game_id: None,
            player_color,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn is_players_turn(&self) -> bool {
        self.side_to_move() == self.player_color
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("fen", &self.fen())
            .field("terminal", &self.terminal)
            .field("game_id", &self.game_id)
            .field("player_color", &self.player_color)
            .finish()
    }
}

/// A move held between the user's gesture and its promotion choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub source: Square,
    pub target: Square,
    pub promotion: Option<Piece>,
}

impl PendingMove {
    pub fn new(source: Square, target: Square) -> Self {
        PendingMove {
            source,
            target,
            promotion: None,
        }
    }

    pub fn with_promotion(self, piece: Piece) -> Self {
        PendingMove {
            promotion: Some(piece),
            ..self
        }
    }

    pub fn to_chess_move(&self) -> ChessMove {
        ChessMove::new(self.source, self.target, self.promotion)
    }

    /// Coordinate notation sent to the authority, e.g. `e2e4` or `a7a8q`.
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(piece) => format!("{}{}{}", self.source, self.target, piece_letter(piece)),
            None => format!("{}{}", self.source, self.target),
        }
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}
