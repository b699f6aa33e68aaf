use chess::Square;

use crate::error::SessionResult;
use crate::models::PendingMove;
use crate::session::pipeline::Request;

/// What became of a drag (or completed tap) from one square to another
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The move was applied speculatively and must be sent to the authority.
    Submitted(Request),
    /// A pawn reached the last rank; nothing is sent until a piece is chosen.
    AwaitingPromotion(PendingMove),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SquareSelection {
    /// An own piece was picked up; these are its legal destinations.
    Highlighted(Vec<Square>),
    /// Second tap on a highlighted square
    Attempted(GestureOutcome),
    Cleared,
}

/// The capability the board renderer is handed for reporting input.
pub trait MoveGestureSink {
    fn on_attempt_move(&mut self, source: Square, target: Square) -> SessionResult<GestureOutcome>;

    fn on_square_selected(&mut self, square: Square) -> SessionResult<SquareSelection>;
}
