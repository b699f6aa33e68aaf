use chess::Piece;
use log::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::models::PendingMove;

/// Pawn promotion as an explicit two-state machine.
///
/// A pawn move to the last rank parks here until the player picks a piece.
/// Nothing is applied to the mirror or sent to the authority while a move
/// is parked; the only ways out are [`PromotionState::choose`] and
/// [`PromotionState::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionState {
    #[default]
    Idle,
    AwaitingChoice { pending: PendingMove },
}

impl PromotionState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, PromotionState::AwaitingChoice { .. })
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        match self {
            PromotionState::AwaitingChoice { pending } => Some(pending),
            PromotionState::Idle => None,
        }
    }

    /// Park a move until the player chooses a piece
    pub fn intercept(&mut self, pending: PendingMove) -> SessionResult<()> {
        match self {
            PromotionState::Idle => {
                debug!("Awaiting promotion choice for {}{}", pending.source, pending.target);
                *self = PromotionState::AwaitingChoice { pending };
                Ok(())
            }
            PromotionState::AwaitingChoice { .. } => Err(SessionError::PromotionPending),
        }
    }

    /// Resolve the parked move with the chosen piece kind.
    ///
    /// An invalid piece leaves the state untouched so the player can choose
    /// again.
    pub fn choose(&mut self, piece: Piece) -> SessionResult<PendingMove> {
        let pending = match self {
            PromotionState::AwaitingChoice { pending } => *pending,
            PromotionState::Idle => return Err(SessionError::NoPendingPromotion),
        };
        match piece {
            Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight => {
                *self = PromotionState::Idle;
                Ok(pending.with_promotion(piece))
            }
            Piece::Pawn | Piece::King => Err(SessionError::InvalidPromotionPiece(piece)),
        }
    }

    /// Discard any parked move
    pub fn cancel(&mut self) -> Option<PendingMove> {
        match std::mem::take(self) {
            PromotionState::AwaitingChoice { pending } => {
                info!("Discarded pending promotion {}{}", pending.source, pending.target);
                Some(pending)
            }
            PromotionState::Idle => None,
        }
    }
}
