use chess::{Board, ChessMove, Color, Piece, Square};
use log::{debug, warn};
use std::str::FromStr;

use crate::error::{SessionError, SessionResult};
use crate::game::utils::{classify, halfmove_clock, is_legal, parse_uci, same_position};
use crate::models::{GameState, TerminalStatus};

#[derive(Clone)]
struct MirrorState {
    state: GameState,
    position_hashes: Vec<u64>,
    halfmove_clock: u32,
}

impl MirrorState {
    fn fresh(player_color: Color) -> Self {
        let state = GameState::new(player_color);
        let position_hashes = vec![state.board.get_hash()];
        MirrorState {
            state,
            position_hashes,
            halfmove_clock: 0,
        }
    }
}

/// What the authority told us about the game after a round trip
#[derive(Debug, Clone)]
pub struct AuthoritativeUpdate<'a> {
    pub fen: &'a str,
    pub history: &'a [String],
    pub player_color: Color,
    pub game_id: Option<String>,
    pub reported_result: Option<&'a str>,
}

pub struct LocalMirror {
    live: MirrorState,
    snapshot: Option<MirrorState>,
}

impl LocalMirror {
    pub fn new(player_color: Color) -> Self {
        LocalMirror {
            live: MirrorState::fresh(player_color),
            snapshot: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.live.state
    }

    /// True while a speculative move is waiting for the authority.
    pub fn is_speculating(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Validate turn ownership and legality without touching any state.
    pub fn check(&self, chess_move: ChessMove) -> SessionResult<()> {
        let state = &self.live.state;
        if state.terminal.is_over() {
            return Err(SessionError::InputDisabled(format!("{:?}", state.terminal)));
        }
        if !state.is_players_turn() {
            return Err(SessionError::NotYourTurn);
        }
        if !is_legal(&state.board, chess_move) {
            return Err(SessionError::IllegalMove(chess_move.to_string()));
        }
        Ok(())
    }

    /// Apply a move ahead of the authority's confirmation.
    ///
    /// The pre-move state is kept so [`LocalMirror::rollback`] can restore it
    /// exactly. Only one speculative move may be outstanding.
    pub fn apply_speculative(&mut self, chess_move: ChessMove) -> SessionResult<&GameState> {
        self.check(chess_move)?;
        if self.snapshot.is_some() {
            return Err(SessionError::Busy);
        }

        let board = self.live.state.board;
        let resets_clock = board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || board.piece_on(chess_move.get_dest()).is_some();

        self.snapshot = Some(self.live.clone());
        let next = board.make_move_new(chess_move);
        self.live.halfmove_clock = if resets_clock { 0 } else { self.live.halfmove_clock + 1 };
        self.live.position_hashes.push(next.get_hash());
        self.live.state.board = next;
        self.live.state.terminal =
            classify(&next, &self.live.position_hashes, self.live.halfmove_clock);
        debug!("Speculatively applied {}", chess_move);
        Ok(&self.live.state)
    }

    /// Restore the last authoritative state. Returns false if nothing was
    /// speculative.
    pub fn rollback(&mut self) -> bool {
        match self.snapshot.take() {
            Some(previous) => {
                debug!("Rolling back speculative move to {}", previous.state.fen());
                self.live = previous;
                true
            }
            None => false,
        }
    }

    /// Replace the mirror with the authority's view of the game.
    ///
    /// Nothing is modified if the position cannot be parsed.
    pub fn commit(&mut self, update: AuthoritativeUpdate<'_>) -> SessionResult<&GameState> {
        let board = Board::from_str(update.fen)
            .map_err(|_| SessionError::MalformedPosition(update.fen.to_string()))?;

        let position_hashes = match replay_hashes(update.history) {
            Some((last, hashes)) if same_position(&last, &board) => hashes,
            _ => {
                if !update.history.is_empty() {
                    warn!("History does not replay to the reported position; repetition tracking restarts here");
                }
                vec![board.get_hash()]
            }
        };
        let halfmove_clock = halfmove_clock(update.fen);

        let mut terminal = classify(&board, &position_hashes, halfmove_clock);
        if terminal == TerminalStatus::None && update.reported_result == Some("1/2-1/2") {
            terminal = TerminalStatus::DrawOther;
        }

        self.snapshot = None;
        self.live = MirrorState {
            state: GameState {
                board,
                terminal,
                game_id: update.game_id,
                player_color: update.player_color,
            },
            position_hashes,
            halfmove_clock,
        };
        Ok(&self.live.state)
    }

    /// Legal destinations of the piece standing on `source`
    pub fn legal_targets(&self, source: Square) -> Vec<Square> {
        let board = &self.live.state.board;
        let mut targets: Vec<Square> = chess::MoveGen::new_legal(board)
            .filter(|m| m.get_source() == source)
            .map(|m| m.get_dest())
            .collect();
        // Promotions generate one move per piece kind
        targets.sort();
        targets.dedup();
        targets
    }

    /// Drop all state and start over from the initial position.
    pub fn clear(&mut self, player_color: Color) {
        self.live = MirrorState::fresh(player_color);
        self.snapshot = None;
    }
}

/// Replay coordinate moves from the initial position, collecting the hash
/// of every position reached. `None` if any move does not apply.
fn replay_hashes(history: &[String]) -> Option<(Board, Vec<u64>)> {
    let mut board = Board::default();
    let mut hashes = Vec::with_capacity(history.len() + 1);
    hashes.push(board.get_hash());
    for text in history {
        let chess_move = parse_uci(text)?;
        if !is_legal(&board, chess_move) {
            return None;
        }
        board = board.make_move_new(chess_move);
        hashes.push(board.get_hash());
    }
    Some((board, hashes))
}
