pub mod actor;
pub mod gesture;
pub mod identity;
pub mod pipeline;

use chess::{Color, Piece, Square};
use log::{debug, info, warn};

use crate::authority::{AuthorityCall, AuthorityReply};
use crate::config::{Difficulty, SessionSettings};
use crate::error::{AuthorityError, SessionError, SessionResult};
use crate::game::utils::{color_to_string, is_promotion_move, parse_color};
use crate::game::{
    AuthoritativeUpdate, LocalMirror, MoveHistory, Navigation, Projection, PromotionState, TickOutcome,
    TimeControl, TimerCoordinator,
};
use crate::models::api::{MoveRequest, SavedGame, StateResponse, RESET_MARKER};
use crate::models::{GameState, PendingMove, TerminalStatus};

pub use actor::SessionActor;
pub use gesture::{GestureOutcome, MoveGestureSink, SquareSelection};
pub use identity::{Identity, LocalStore};
pub use pipeline::{Pipeline, Request, RequestKind};

/// How a finished request changed the session
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The response belonged to a request that is no longer in flight.
    Stale,
    State,
    Hint(Option<String>),
    Saved(String),
    Games(Vec<SavedGame>),
    /// The session is over; the owner must tear it down and redirect.
    SignedOut { clear_identity: bool },
}

/// The owned game session. Actions hand back a [`Request`] to send; its
/// outcome comes back through [`Session::complete`].
pub struct Session {
    identity: Identity,
    settings: SessionSettings,
    mirror: LocalMirror,
    promotion: PromotionState,
    history: MoveHistory,
    viewing: Option<Projection>,
    timers: TimerCoordinator,
    pipeline: Pipeline,
    selected: Option<Square>,
    highlights: Vec<Square>,
    hint: Option<String>,
    win_probability: Option<f64>,
    result: Option<String>,
    last_reply: Option<String>,
}

impl Session {
    /// Start a session for a signed-in identity. Without one there is no
    /// session at all.
    pub fn create(identity: Option<Identity>, settings: SessionSettings) -> SessionResult<Self> {
        let identity = identity.ok_or(SessionError::Unauthenticated)?;
        info!(
            "Session created for {} ({}, {:?})",
            identity.username,
            settings.difficulty.as_str(),
            settings.time_control
        );
        Ok(Session {
            identity,
            settings,
            mirror: LocalMirror::new(Color::White),
            promotion: PromotionState::default(),
            history: MoveHistory::new(),
            viewing: None,
            timers: TimerCoordinator::new(settings.time_control.seconds()),
            pipeline: Pipeline::new(),
            selected: None,
            highlights: Vec::new(),
            hint: None,
            win_probability: None,
            result: None,
            last_reply: None,
        })
    }

    pub fn teardown(mut self) {
        self.timers.stop_all();
        if let Some(in_flight) = self.pipeline.abandon() {
            debug!("Abandoning request #{} ({:?}) on teardown", in_flight.seq, in_flight.kind);
        }
        self.promotion.cancel();
        info!("Session for {} torn down", self.identity.username);
    }

    pub fn fetch_state(&mut self) -> SessionResult<Request> {
        self.issue(RequestKind::FetchState, AuthorityCall::FetchState)
    }

    /// Handle a drag from `source` to `target`.
    pub fn attempt_move(&mut self, source: Square, target: Square) -> SessionResult<GestureOutcome> {
        if self.promotion.is_awaiting() {
            return Err(SessionError::PromotionPending);
        }
        self.ensure_can_move()?;

        let pending = PendingMove::new(source, target);
        if is_promotion_move(&self.mirror.state().board, source, target) {
            // Probe legality with any piece kind before asking for one
            self.mirror.check(pending.with_promotion(Piece::Queen).to_chess_move())?;
            self.promotion.intercept(pending)?;
            self.clear_selection();
            return Ok(GestureOutcome::AwaitingPromotion(pending));
        }
        self.submit(pending).map(GestureOutcome::Submitted)
    }

    /// Tap-to-move: pick up an own piece, or complete a move onto one of its
    /// highlighted destinations.
    pub fn select_square(&mut self, square: Square) -> SessionResult<SquareSelection> {
        if let Some(source) = self.selected {
            if self.highlights.contains(&square) {
                self.clear_selection();
                return self.attempt_move(source, square).map(SquareSelection::Attempted);
            }
        }

        let state = self.mirror.state();
        if state.board.color_on(square) != Some(state.player_color) {
            self.clear_selection();
            return Ok(SquareSelection::Cleared);
        }
        if self.promotion.is_awaiting() {
            return Err(SessionError::PromotionPending);
        }
        self.ensure_can_move()?;

        let targets = self.mirror.legal_targets(square);
        if targets.is_empty() {
            self.clear_selection();
            return Ok(SquareSelection::Cleared);
        }
        self.selected = Some(square);
        self.highlights = targets.clone();
        Ok(SquareSelection::Highlighted(targets))
    }

    pub fn choose_promotion(&mut self, piece: Piece) -> SessionResult<Request> {
        if self.pipeline.is_busy() {
            return Err(SessionError::Busy);
        }
        if !self.promotion.is_awaiting() {
            return Err(SessionError::NoPendingPromotion);
        }
        self.ensure_can_move()?;
        let pending = self.promotion.choose(piece)?;
        self.submit(pending)
    }

    pub fn cancel_promotion(&mut self) -> Option<PendingMove> {
        self.promotion.cancel()
    }

    /// Ask the authority for a fresh game. Allowed even when the current
    /// game is over.
    pub fn new_game(
        &mut self,
        color: Option<Color>,
        difficulty: Option<Difficulty>,
        time_control: Option<TimeControl>,
    ) -> SessionResult<Request> {
        if self.pipeline.is_busy() {
            return Err(SessionError::Busy);
        }
        self.promotion.cancel();
        self.clear_selection();
        if let Some(difficulty) = difficulty {
            self.settings.difficulty = difficulty;
        }
        if let Some(time_control) = time_control {
            self.settings.time_control = time_control;
        }
        let color = color.unwrap_or(self.mirror.state().player_color);
        let request = MoveRequest {
            move_str: RESET_MARKER.to_string(),
            difficulty: self.settings.difficulty.as_str().to_string(),
            player_color: color_to_string(color),
            game_id: None,
        };
        self.issue(RequestKind::Reset, AuthorityCall::SubmitMove(request))
    }

    pub fn resume(&mut self, game_id: &str) -> SessionResult<Request> {
        if self.pipeline.is_busy() {
            return Err(SessionError::Busy);
        }
        self.promotion.cancel();
        self.clear_selection();
        self.issue(RequestKind::Resume, AuthorityCall::Resume(game_id.to_string()))
    }

    pub fn request_hint(&mut self) -> SessionResult<Request> {
        if let Some(reason) = self.frozen_reason() {
            return Err(SessionError::InputDisabled(reason));
        }
        self.issue(RequestKind::Hint, AuthorityCall::Hint)
    }

    pub fn save(&mut self) -> SessionResult<Request> {
        self.issue(RequestKind::Save, AuthorityCall::Save)
    }

    pub fn list_games(&mut self) -> SessionResult<Request> {
        self.issue(RequestKind::ListGames, AuthorityCall::ListGames)
    }

    /// Logging out wins over whatever is in flight.
    pub fn logout(&mut self) -> SessionResult<Request> {
        if let Some(in_flight) = self.pipeline.abandon() {
            info!("Logout abandons request #{} ({:?})", in_flight.seq, in_flight.kind);
            self.mirror.rollback();
        }
        self.promotion.cancel();
        self.timers.stop_all();
        self.issue(RequestKind::Logout, AuthorityCall::Logout)
    }

    /// Move the history cursor. Never touches the live game.
    pub fn navigate(&mut self, navigation: Navigation) -> SessionResult<Projection> {
        let projection = self.history.navigate(navigation, &self.mirror.state().board)?;
        if self.history.is_live() {
            self.viewing = None;
        } else {
            self.clear_selection();
            self.viewing = Some(projection.clone());
        }
        Ok(projection)
    }

    /// What the board should currently show: the live game or a past position.
    pub fn projection(&self) -> Projection {
        match &self.viewing {
            Some(projection) if !self.history.is_live() => projection.clone(),
            _ => Projection {
                board: self.mirror.state().board,
                cursor: self.history.cursor(),
                last_move: self.history.last_move().map(str::to_string),
            },
        }
    }

    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let outcome = self.timers.tick(generation);
        if let TickOutcome::Flagged(color) = outcome {
            info!("{} lost on time", color_to_string(color));
            self.promotion.cancel();
            self.clear_selection();
        }
        outcome
    }

    /// Apply the outcome of request `seq`.
    ///
    /// Authority failures roll the mirror back and are returned as errors.
    /// An unauthenticated answer to anything is a sign-out instead.
    pub fn complete(
        &mut self,
        seq: u64,
        outcome: Result<AuthorityReply, AuthorityError>,
    ) -> SessionResult<Completion> {
        let kind = match self.pipeline.release(seq) {
            Some(kind) => kind,
            None => return Ok(Completion::Stale),
        };

        if kind == RequestKind::Logout {
            if let Err(e) = &outcome {
                warn!("Logout failed on the authority ({}); signing out locally", e);
            }
            self.sign_out();
            return Ok(Completion::SignedOut { clear_identity: true });
        }

        let reply = match outcome {
            Ok(reply) => reply,
            Err(AuthorityError::Unauthenticated) => {
                warn!("Authority reports the session as unauthenticated during {:?}", kind);
                self.sign_out();
                return Ok(Completion::SignedOut { clear_identity: false });
            }
            Err(e) => {
                if self.mirror.rollback() {
                    info!("Rolled back speculative move after {:?} failed", kind);
                }
                warn!("{:?} failed: {}", kind, e);
                return Err(e.into());
            }
        };

        match reply {
            AuthorityReply::State(response) => self.apply_state(kind, response).map(|()| Completion::State),
            AuthorityReply::Hint(suggestion) => {
                debug!("Hint: {:?}", suggestion);
                self.hint = suggestion.clone();
                Ok(Completion::Hint(suggestion))
            }
            AuthorityReply::Saved(game_id) => {
                info!("Game saved as {}", game_id);
                Ok(Completion::Saved(game_id))
            }
            AuthorityReply::Games(games) => {
                debug!("{} saved games", games.len());
                Ok(Completion::Games(games))
            }
            AuthorityReply::LoggedOut => {
                self.sign_out();
                Ok(Completion::SignedOut { clear_identity: true })
            }
        }
    }

    fn apply_state(&mut self, kind: RequestKind, response: StateResponse) -> SessionResult<()> {
        if let Some(error) = response.error {
            self.mirror.rollback();
            warn!("Authority rejected {:?}: {}", kind, error);
            return Err(AuthorityError::Rejected(error).into());
        }
        let fen = match response.fen.as_deref() {
            Some(fen) => fen,
            None => {
                self.mirror.rollback();
                return Err(AuthorityError::Malformed("state without a position".to_string()).into());
            }
        };

        let previous_game = self.mirror.state().game_id.clone();
        let player_color = response
            .player_color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(self.mirror.state().player_color);
        let game_id = match &response.game_id {
            Some(id) => Some(id.clone()),
            None if kind.starts_game() => None,
            None => previous_game.clone(),
        };
        let update = AuthoritativeUpdate {
            fen,
            history: &response.history,
            player_color,
            game_id,
            reported_result: response.result.as_deref(),
        };
        let (side_to_move, new_game_id) = match self.mirror.commit(update) {
            Ok(state) => (state.side_to_move(), state.game_id.clone()),
            Err(e) => {
                self.mirror.rollback();
                return Err(e);
            }
        };

        self.history.set_history(response.history);
        self.viewing = None;
        self.clear_selection();
        self.hint = None;
        self.win_probability = response.probability.map(|p| p.clamp(0.0, 100.0));
        self.result = response.result.filter(|result| !result.trim().is_empty());
        self.last_reply = response.reply_move;

        if kind.starts_game() || new_game_id != previous_game {
            self.timers.reset_all(self.settings.time_control.seconds());
        }
        match self.frozen_reason() {
            Some(reason) => {
                info!("Game frozen: {}", reason);
                self.timers.stop_all();
            }
            None => {
                self.timers.start(side_to_move);
            }
        }
        info!(
            "Applied {:?}: {} plies, {} to move",
            kind,
            self.history.len(),
            color_to_string(side_to_move)
        );
        Ok(())
    }

    fn submit(&mut self, pending: PendingMove) -> SessionResult<Request> {
        if is_promotion_move(&self.mirror.state().board, pending.source, pending.target)
            && pending.promotion.is_none()
        {
            return Err(SessionError::MissingPromotion(pending.to_uci()));
        }
        self.mirror.apply_speculative(pending.to_chess_move())?;
        let seq = match self.pipeline.acquire(RequestKind::Move) {
            Ok(seq) => seq,
            Err(e) => {
                self.mirror.rollback();
                return Err(e);
            }
        };
        self.clear_selection();

        let state = self.mirror.state();
        let request = MoveRequest {
            move_str: pending.to_uci(),
            difficulty: self.settings.difficulty.as_str().to_string(),
            player_color: color_to_string(state.player_color),
            game_id: state.game_id.clone(),
        };
        info!("Submitting {} as request #{}", request.move_str, seq);
        Ok(Request {
            seq,
            call: AuthorityCall::SubmitMove(request),
        })
    }

    fn issue(&mut self, kind: RequestKind, call: AuthorityCall) -> SessionResult<Request> {
        let seq = self.pipeline.acquire(kind)?;
        debug!("Issuing {} as request #{}", call.name(), seq);
        Ok(Request { seq, call })
    }

    fn sign_out(&mut self) {
        self.timers.stop_all();
        self.pipeline.abandon();
        self.promotion.cancel();
        self.mirror.clear(self.mirror.state().player_color);
        self.history.set_history(Vec::new());
        self.viewing = None;
        self.clear_selection();
        self.hint = None;
        self.win_probability = None;
        self.result = None;
        self.last_reply = None;
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.highlights.clear();
    }

    /// Why the game accepts no more moves, if it is over
    fn frozen_reason(&self) -> Option<String> {
        if self.timers.flagged().is_some() || self.result.is_some() || self.mirror.state().terminal.is_over() {
            Some(self.status_line())
        } else {
            None
        }
    }

    fn ensure_can_move(&self) -> SessionResult<()> {
        if let Some(reason) = self.frozen_reason() {
            return Err(SessionError::InputDisabled(reason));
        }
        if self.pipeline.is_busy() {
            return Err(SessionError::Busy);
        }
        if !self.history.is_live() {
            return Err(SessionError::ViewingHistory);
        }
        Ok(())
    }

    /// Whether a move gesture would currently be accepted (turn aside).
    pub fn input_enabled(&self) -> bool {
        !self.promotion.is_awaiting() && self.ensure_can_move().is_ok()
    }

    pub fn status_line(&self) -> String {
        if let Some(color) = self.timers.flagged() {
            return format!("{} lost on time", color_to_string(color));
        }
        if let Some(result) = &self.result {
            return format!("Game Over: {}", result);
        }
        let state = self.mirror.state();
        match state.terminal {
            TerminalStatus::Checkmate => "Checkmate".to_string(),
            TerminalStatus::Stalemate => "Stalemate".to_string(),
            TerminalStatus::DrawByRepetition | TerminalStatus::DrawByMaterial | TerminalStatus::DrawOther => {
                "Draw".to_string()
            }
            TerminalStatus::None => format!("{} to move", color_to_string(state.side_to_move())),
        }
    }

    /// Generation of the running clock, for scheduling its ticks
    pub fn clock_generation(&self) -> Option<u64> {
        self.timers.running().map(|_| self.timers.generation())
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> &GameState {
        self.mirror.state()
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn timers(&self) -> &TimerCoordinator {
        &self.timers
    }

    pub fn promotion(&self) -> &PromotionState {
        &self.promotion
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn highlights(&self) -> &[Square] {
        &self.highlights
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn win_probability(&self) -> Option<f64> {
        self.win_probability
    }

    /// The authority's last reply move, if it made one
    pub fn last_reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }
}

impl MoveGestureSink for Session {
    fn on_attempt_move(&mut self, source: Square, target: Square) -> SessionResult<GestureOutcome> {
        self.attempt_move(source, target)
    }

    fn on_square_selected(&mut self, square: Square) -> SessionResult<SquareSelection> {
        self.select_square(square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cursor;
    use chess::Board;
    use pretty_assertions::assert_eq;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
    const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";
    const PAWN_ON_A7: &str = "7k/P7/8/8/8/8/8/4K3 w - - 0 1";
    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

    fn state(fen: &str, history: &[&str], color: &str) -> StateResponse {
        StateResponse {
            fen: Some(fen.to_string()),
            history: history.iter().map(|m| m.to_string()).collect(),
            player_color: Some(color.to_string()),
            game_id: Some("game-1".to_string()),
            probability: Some(50.0),
            ..StateResponse::default()
        }
    }

    fn session() -> Session {
        Session::create(Some(Identity::new("alice")), SessionSettings::default()).unwrap()
    }

    /// A session whose initial fetch has been answered with `response`
    fn loaded(response: StateResponse) -> Session {
        let mut session = session();
        let request = session.fetch_state().unwrap();
        session
            .complete(request.seq, Ok(AuthorityReply::State(response)))
            .unwrap();
        session
    }

    fn submitted(outcome: GestureOutcome) -> Request {
        match outcome {
            GestureOutcome::Submitted(request) => request,
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    fn sent_move(request: &Request) -> &MoveRequest {
        match &request.call {
            AuthorityCall::SubmitMove(body) => body,
            other => panic!("expected a move, got {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_identity() {
        let result = Session::create(None, SessionSettings::default());
        assert!(matches!(result, Err(SessionError::Unauthenticated)));
    }

    #[test]
    fn test_confirmed_move_hands_clock_to_black() {
        let mut session = loaded(state(START, &[], "White"));
        assert!(session.timers().is_running(Color::White));

        let request = submitted(session.attempt_move(Square::E2, Square::E4).unwrap());
        assert_eq!(sent_move(&request).move_str, "e2e4");
        assert_eq!(sent_move(&request).player_color, "White");
        assert_eq!(sent_move(&request).game_id.as_deref(), Some("game-1"));
        assert!(session.is_busy());

        let completion = session
            .complete(request.seq, Ok(AuthorityReply::State(state(AFTER_E4, &["e2e4"], "White"))))
            .unwrap();
        assert_eq!(completion, Completion::State);
        assert_eq!(session.state().side_to_move(), Color::Black);
        assert_eq!(session.history().moves(), &["e2e4".to_string()]);
        assert!(!session.timers().is_running(Color::White));
        assert!(session.timers().is_running(Color::Black));
        assert_eq!(session.status_line(), "Black to move");
    }

    #[test]
    fn test_promotion_waits_for_a_piece() {
        let mut session = loaded(state(PAWN_ON_A7, &[], "White"));

        let outcome = session.attempt_move(Square::A7, Square::A8).unwrap();
        assert_eq!(outcome, GestureOutcome::AwaitingPromotion(PendingMove::new(Square::A7, Square::A8)));
        assert!(!session.is_busy());
        assert!(!session.input_enabled());
        assert!(matches!(
            session.attempt_move(Square::E1, Square::E2),
            Err(SessionError::PromotionPending)
        ));

        let request = session.choose_promotion(Piece::Queen).unwrap();
        assert_eq!(sent_move(&request).move_str, "a7a8q");
        assert!(!session.promotion().is_awaiting());
    }

    #[test]
    fn test_cancelled_promotion_sends_nothing() {
        let mut session = loaded(state(PAWN_ON_A7, &[], "White"));
        session.attempt_move(Square::A7, Square::A8).unwrap();
        assert!(session.cancel_promotion().is_some());
        assert!(matches!(
            session.choose_promotion(Piece::Queen),
            Err(SessionError::NoPendingPromotion)
        ));
        assert!(!session.is_busy());
        assert!(session.input_enabled());
    }

    #[test]
    fn test_rejection_restores_previous_state() {
        let mut session = loaded(state(START, &[], "White"));
        let before = session.state().clone();

        let request = submitted(session.attempt_move(Square::E2, Square::E4).unwrap());
        let mut rejected = state(START, &[], "White");
        rejected.error = Some("Illegal move".to_string());
        let result = session.complete(request.seq, Ok(AuthorityReply::State(rejected)));

        assert!(matches!(
            result,
            Err(SessionError::Authority(AuthorityError::Rejected(ref message))) if message == "Illegal move"
        ));
        assert_eq!(session.state(), &before);
        assert!(session.history().is_empty());
        assert!(session.timers().is_running(Color::White));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_transport_failure_restores_previous_state() {
        let mut session = loaded(state(START, &[], "White"));
        let before = session.state().clone();

        let request = submitted(session.attempt_move(Square::G1, Square::F3).unwrap());
        let result = session.complete(request.seq, Err(AuthorityError::Transport("timed out".to_string())));

        assert!(matches!(result, Err(SessionError::Authority(AuthorityError::Transport(_)))));
        assert_eq!(session.state(), &before);
        assert!(session.input_enabled());
    }

    #[test]
    fn test_unauthenticated_tears_down() {
        let mut session = loaded(state(AFTER_E4_E5, &["e2e4", "e7e5"], "White"));
        let request = submitted(session.attempt_move(Square::G1, Square::F3).unwrap());

        let completion = session.complete(request.seq, Err(AuthorityError::Unauthenticated)).unwrap();
        assert_eq!(completion, Completion::SignedOut { clear_identity: false });
        assert_eq!(session.timers().running(), None);
        assert!(session.history().is_empty());
        assert!(!session.is_busy());
        assert!(Board::default() == session.state().board);
    }

    #[test]
    fn test_running_out_of_time_freezes_input() {
        let mut session = loaded(state(START, &[], "White"));
        let generation = session.clock_generation().unwrap();

        let mut last = TickOutcome::Ignored;
        for _ in 0..TimeControl::Blitz.seconds() {
            last = session.tick(generation);
        }
        assert_eq!(last, TickOutcome::Flagged(Color::White));
        assert_eq!(session.timers().running(), None);
        assert_eq!(session.status_line(), "White lost on time");
        assert!(matches!(
            session.attempt_move(Square::E2, Square::E4),
            Err(SessionError::InputDisabled(_))
        ));
        assert_eq!(session.tick(generation), TickOutcome::Ignored);
    }

    #[test]
    fn test_terminal_game_freezes_moves_and_hints_but_not_navigation() {
        let mut session = loaded(state(FOOLS_MATE, &["f2f3", "e7e5", "g2g4", "d8h4"], "White"));
        assert_eq!(session.state().terminal, TerminalStatus::Checkmate);
        assert_eq!(session.status_line(), "Checkmate");
        assert_eq!(session.timers().running(), None);

        assert!(matches!(session.request_hint(), Err(SessionError::InputDisabled(_))));
        assert!(matches!(
            session.attempt_move(Square::E2, Square::E4),
            Err(SessionError::InputDisabled(_))
        ));
        let projection = session.navigate(Navigation::First).unwrap();
        assert_eq!(projection.cursor, Cursor::At(1));
    }

    #[test]
    fn test_reported_result_freezes_input() {
        let mut response = state(START, &[], "White");
        response.result = Some("0-1".to_string());
        let mut session = loaded(response);
        assert_eq!(session.status_line(), "Game Over: 0-1");
        assert!(!session.input_enabled());
        assert!(session.new_game(None, None, None).is_ok());
    }

    #[test]
    fn test_second_action_while_busy_is_refused() {
        let mut session = session();
        let request = session.fetch_state().unwrap();
        assert!(matches!(session.attempt_move(Square::E2, Square::E4), Err(SessionError::Busy)));
        assert!(matches!(session.save(), Err(SessionError::Busy)));

        assert_eq!(
            session.complete(request.seq + 1, Ok(AuthorityReply::State(state(START, &[], "White")))).unwrap(),
            Completion::Stale
        );
        assert!(session.is_busy());
    }

    #[test]
    fn test_moves_refused_while_viewing_history() {
        let mut session = loaded(state(AFTER_E4_E5, &["e2e4", "e7e5"], "White"));
        let projection = session.navigate(Navigation::Back).unwrap();
        assert_eq!(projection.cursor, Cursor::At(1));
        assert_eq!(session.projection().board.side_to_move(), Color::Black);
        assert!(matches!(
            session.attempt_move(Square::G1, Square::F3),
            Err(SessionError::ViewingHistory)
        ));

        session.navigate(Navigation::Live).unwrap();
        assert!(session.projection().board == session.state().board);
        assert!(session.attempt_move(Square::G1, Square::F3).is_ok());
    }

    #[test]
    fn test_navigation_past_the_end_is_live() {
        let mut session = loaded(state(AFTER_E4_E5, &["e2e4", "e7e5"], "White"));
        let projection = session.navigate(Navigation::To(7)).unwrap();
        assert_eq!(projection.cursor, Cursor::Live);
    }

    #[test]
    fn test_tap_to_move() {
        let mut session = loaded(state(START, &[], "White"));
        assert_eq!(
            session.select_square(Square::E2).unwrap(),
            SquareSelection::Highlighted(vec![Square::E3, Square::E4])
        );
        assert_eq!(session.selected(), Some(Square::E2));

        match session.select_square(Square::E4).unwrap() {
            SquareSelection::Attempted(GestureOutcome::Submitted(request)) => {
                assert_eq!(sent_move(&request).move_str, "e2e4")
            }
            other => panic!("unexpected selection {:?}", other),
        }
        assert!(session.highlights().is_empty());
    }

    #[test]
    fn test_tap_elsewhere_clears_selection() {
        let mut session = loaded(state(START, &[], "White"));
        session.select_square(Square::G1).unwrap();
        assert_eq!(session.select_square(Square::E7).unwrap(), SquareSelection::Cleared);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_new_game_as_black_resets_clocks() {
        let mut session = loaded(state(START, &[], "White"));
        let generation = session.clock_generation().unwrap();
        for _ in 0..10 {
            session.tick(generation);
        }
        assert_eq!(session.timers().remaining(Color::White), TimeControl::Blitz.seconds() - 10);

        let request = session
            .new_game(Some(Color::Black), Some(Difficulty::Hard), Some(TimeControl::Rapid))
            .unwrap();
        let body = sent_move(&request);
        assert!(body.is_reset());
        assert_eq!(body.player_color, "Black");
        assert_eq!(body.difficulty, "Hard");

        let mut response = state(AFTER_E4, &["e2e4"], "Black");
        response.game_id = Some("game-2".to_string());
        response.reply_move = Some("e2e4".to_string());
        session.complete(request.seq, Ok(AuthorityReply::State(response))).unwrap();

        assert_eq!(session.state().player_color, Color::Black);
        assert_eq!(session.timers().remaining(Color::White), TimeControl::Rapid.seconds());
        assert!(session.timers().is_running(Color::Black));
        assert_eq!(session.last_reply(), Some("e2e4"));
        assert!(session.input_enabled());
    }

    #[test]
    fn test_resume_resets_clocks_and_history() {
        let mut session = loaded(state(AFTER_E4_E5, &["e2e4", "e7e5"], "White"));
        let generation = session.clock_generation().unwrap();
        for _ in 0..5 {
            session.tick(generation);
        }
        assert_eq!(session.timers().remaining(Color::White), TimeControl::Blitz.seconds() - 5);
        session.navigate(Navigation::Back).unwrap();
        assert_eq!(session.history().cursor(), Cursor::At(1));

        let request = session.resume("game-2").unwrap();
        assert_eq!(request.call, AuthorityCall::Resume("game-2".to_string()));
        let mut response = state(AFTER_NF3, &["e2e4", "e7e5", "g1f3"], "Black");
        response.game_id = Some("game-2".to_string());
        session.complete(request.seq, Ok(AuthorityReply::State(response))).unwrap();

        assert_eq!(session.state().game_id.as_deref(), Some("game-2"));
        assert_eq!(session.state().player_color, Color::Black);
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history().cursor(), Cursor::Live);
        assert_eq!(session.projection().cursor, Cursor::Live);
        assert_eq!(session.timers().remaining(Color::White), TimeControl::Blitz.seconds());
        assert_eq!(session.timers().remaining(Color::Black), TimeControl::Blitz.seconds());
        assert!(session.timers().is_running(Color::Black));
        assert!(!session.timers().is_running(Color::White));
        assert_ne!(session.clock_generation(), Some(generation));
        assert!(session.input_enabled());
    }

    #[test]
    fn test_new_game_id_on_move_resets_clocks() {
        let mut session = loaded(state(START, &[], "White"));
        let generation = session.clock_generation().unwrap();
        for _ in 0..7 {
            session.tick(generation);
        }

        let request = submitted(session.attempt_move(Square::E2, Square::E4).unwrap());
        let mut response = state(AFTER_E4, &["e2e4"], "White");
        response.game_id = Some("game-9".to_string());
        session.complete(request.seq, Ok(AuthorityReply::State(response))).unwrap();

        assert_eq!(session.state().game_id.as_deref(), Some("game-9"));
        assert_eq!(session.timers().remaining(Color::White), TimeControl::Blitz.seconds());
        assert_eq!(session.timers().remaining(Color::Black), TimeControl::Blitz.seconds());
        assert!(session.timers().is_running(Color::Black));
    }

    #[test]
    fn test_same_game_id_on_move_keeps_clocks() {
        let mut session = loaded(state(START, &[], "White"));
        let generation = session.clock_generation().unwrap();
        for _ in 0..7 {
            session.tick(generation);
        }

        let request = submitted(session.attempt_move(Square::E2, Square::E4).unwrap());
        session
            .complete(request.seq, Ok(AuthorityReply::State(state(AFTER_E4, &["e2e4"], "White"))))
            .unwrap();

        assert_eq!(session.timers().remaining(Color::White), TimeControl::Blitz.seconds() - 7);
        assert!(session.timers().is_running(Color::Black));
    }

    #[test]
    fn test_hint_cleared_by_next_state() {
        let mut session = loaded(state(START, &[], "White"));
        let request = session.request_hint().unwrap();
        let completion = session
            .complete(request.seq, Ok(AuthorityReply::Hint(Some("e2e4".to_string()))))
            .unwrap();
        assert_eq!(completion, Completion::Hint(Some("e2e4".to_string())));
        assert_eq!(session.hint(), Some("e2e4"));

        let request = submitted(session.attempt_move(Square::E2, Square::E4).unwrap());
        session
            .complete(request.seq, Ok(AuthorityReply::State(state(AFTER_E4, &["e2e4"], "White"))))
            .unwrap();
        assert_eq!(session.hint(), None);
    }

    #[test]
    fn test_probability_is_clamped() {
        let mut response = state(START, &[], "White");
        response.probability = Some(140.0);
        let session = loaded(response);
        assert_eq!(session.win_probability(), Some(100.0));
    }

    #[test]
    fn test_logout_always_clears_identity() {
        let mut session = loaded(state(START, &[], "White"));
        let request = session.logout().unwrap();
        assert_eq!(request.call, AuthorityCall::Logout);
        let completion = session
            .complete(request.seq, Err(AuthorityError::Transport("refused".to_string())))
            .unwrap();
        assert_eq!(completion, Completion::SignedOut { clear_identity: true });
        assert_eq!(session.timers().running(), None);
    }

    #[test]
    fn test_gesture_sink_routes_to_session() {
        let mut session = loaded(state(START, &[], "White"));
        let sink: &mut dyn MoveGestureSink = &mut session;
        assert!(matches!(
            sink.on_attempt_move(Square::E2, Square::E5),
            Err(SessionError::IllegalMove(_))
        ));
        assert!(matches!(sink.on_square_selected(Square::B1), Ok(SquareSelection::Highlighted(_))));
    }
}
