use actix::prelude::*;
use chess::Color;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::authority::{self, AuthorityReply, RemoteAuthority};
use crate::config::SessionSettings;
use crate::error::{AuthorityError, SessionResult};
use crate::game::utils::color_to_string;
use crate::game::{Cursor, TickOutcome};
use crate::models::api::SavedGame;
use crate::models::{ChessWebSocketMessage, Command, Connect, CurrentView, Disconnect, LastMove, ServerMessage};
use crate::session::{Completion, GestureOutcome, LocalStore, MoveGestureSink, Request, Session, SquareSelection};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Owns the session and everything asynchronous around it: requests to the
/// authority, the clock interval and the connected renderers.
///
/// Every authority response is applied inside a single handler call, so
/// renderers never observe a half-applied state.
pub struct SessionActor {
    authority: Arc<dyn RemoteAuthority>,
    store: LocalStore,
    login_url: String,
    session: Option<Session>,
    clients: HashMap<Uuid, Recipient<ChessWebSocketMessage>>,
    ticker: Option<(u64, SpawnHandle)>,
    notice: Option<String>,
    games: Option<Vec<SavedGame>>,
}

impl SessionActor {
    pub fn new(
        authority: Arc<dyn RemoteAuthority>,
        store: LocalStore,
        settings: SessionSettings,
        login_url: impl Into<String>,
    ) -> Self {
        let session = match Session::create(store.identity(), settings) {
            Ok(session) => Some(session),
            Err(e) => {
                info!("Not starting a session: {}", e);
                None
            }
        };
        SessionActor {
            authority,
            store,
            login_url: login_url.into(),
            session,
            clients: HashMap::new(),
            ticker: None,
            notice: None,
            games: None,
        }
    }

    /// Send a request to the authority and route the answer back here.
    fn issue(&mut self, request: Request, ctx: &mut Context<Self>) {
        let identity = match &self.session {
            Some(session) => session.identity().clone(),
            None => return,
        };
        let authority = Arc::clone(&self.authority);
        let Request { seq, call } = request;
        info!("Dispatching {} (#{}) for {}", call.name(), seq, identity.username);

        let fut = async move { authority::dispatch(authority.as_ref(), &identity, call).await };
        ctx.spawn(fut.into_actor(self).map(move |outcome, actor, ctx| {
            actor.on_reply(seq, outcome, ctx);
        }));
    }

    fn on_reply(
        &mut self,
        seq: u64,
        outcome: Result<AuthorityReply, AuthorityError>,
        ctx: &mut Context<Self>,
    ) {
        let completion = match self.session.as_mut() {
            Some(session) => session.complete(seq, outcome),
            None => {
                debug!("Dropping response #{} after teardown", seq);
                return;
            }
        };
        match completion {
            Ok(Completion::Stale) => return,
            Ok(Completion::State) => {}
            Ok(Completion::Hint(Some(_))) => {}
            Ok(Completion::Hint(None)) => self.notice = Some("No hint available".to_string()),
            Ok(Completion::Saved(game_id)) => self.notice = Some(format!("Game saved ({})", game_id)),
            Ok(Completion::Games(games)) => self.games = Some(games),
            Ok(Completion::SignedOut { clear_identity }) => {
                self.sign_out(clear_identity, ctx);
                return;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
        self.sync_clock(ctx);
        self.render();
    }

    /// Keep exactly one interval running, scheduled under the generation of
    /// the session's running clock.
    fn sync_clock(&mut self, ctx: &mut Context<Self>) {
        let wanted = self.session.as_ref().and_then(Session::clock_generation);
        if self.ticker.as_ref().map(|(generation, _)| *generation) == wanted {
            return;
        }
        if let Some((generation, handle)) = self.ticker.take() {
            debug!("Cancelling clock interval for generation {}", generation);
            ctx.cancel_future(handle);
        }
        if let Some(generation) = wanted {
            let handle = ctx.run_interval(TICK_INTERVAL, move |actor, ctx| actor.on_tick(generation, ctx));
            self.ticker = Some((generation, handle));
        }
    }

    fn on_tick(&mut self, generation: u64, ctx: &mut Context<Self>) {
        let outcome = match self.session.as_mut() {
            Some(session) => session.tick(generation),
            None => TickOutcome::Ignored,
        };
        match outcome {
            TickOutcome::Ignored => self.sync_clock(ctx),
            TickOutcome::Ticked { .. } => self.render(),
            TickOutcome::Flagged(color) => {
                self.notice = Some(format!("{} lost on time", color_to_string(color)));
                self.sync_clock(ctx);
                self.render();
            }
        }
    }

    fn sign_out(&mut self, clear_identity: bool, ctx: &mut Context<Self>) {
        if let Some(session) = self.session.take() {
            session.teardown();
        }
        if clear_identity {
            if let Err(e) = self.store.clear_identity() {
                warn!("Could not clear the stored identity: {}", e);
            }
        }
        self.sync_clock(ctx);
        self.notice = None;
        self.games = None;
        info!("Redirecting renderers to {}", self.login_url);
        self.broadcast(&ServerMessage::redirect(self.login_url.clone()));
    }

    fn toggle_dark_mode(&mut self) {
        let enabled = !self.store.dark_mode();
        if let Err(e) = self.store.set_dark_mode(enabled) {
            warn!("Could not persist dark mode: {}", e);
            self.notice = Some(e.to_string());
        }
    }

    fn handle_command(&mut self, command: Command) -> SessionResult<Option<Request>> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Ok(None),
        };
        match command {
            Command::Move { from, to } => session.on_attempt_move(from, to).map(submitted),
            Command::Select(square) => session.on_square_selected(square).map(|selection| match selection {
                SquareSelection::Attempted(outcome) => submitted(outcome),
                SquareSelection::Highlighted(_) | SquareSelection::Cleared => None,
            }),
            Command::Promote(piece) => session.choose_promotion(piece).map(Some),
            Command::CancelPromotion => {
                session.cancel_promotion();
                Ok(None)
            }
            Command::Navigate(navigation) => session.navigate(navigation).map(|_| None),
            Command::NewGame {
                color,
                difficulty,
                time_control,
            } => {
                self.games = None;
                session.new_game(color, difficulty, time_control).map(Some)
            }
            Command::Resume(game_id) => {
                self.games = None;
                session.resume(&game_id).map(Some)
            }
            Command::Save => session.save().map(Some),
            Command::ListGames => session.list_games().map(Some),
            Command::Hint => session.request_hint().map(Some),
            Command::Logout => session.logout().map(Some),
            Command::ToggleDarkMode | Command::Sync => Ok(None),
        }
    }

    fn view(&self) -> ServerMessage {
        let session = match &self.session {
            Some(session) => session,
            None => return ServerMessage::redirect(self.login_url.clone()),
        };
        let state = session.state();
        let timers = session.timers();
        let projection = session.projection();
        let highlights: Vec<String> = session.highlights().iter().map(|square| square.to_string()).collect();

        ServerMessage {
            message_type: "render".to_string(),
            game_id: state.game_id.clone(),
            fen: Some(projection.board.to_string()),
            live: projection.cursor == Cursor::Live,
            cursor: match projection.cursor {
                Cursor::At(index) => Some(index),
                Cursor::Live => None,
            },
            orientation: Some(color_to_string(state.player_color).to_lowercase()),
            status: Some(session.status_line()),
            history: session.history().rows(),
            white_seconds: Some(timers.remaining(Color::White)),
            black_seconds: Some(timers.remaining(Color::Black)),
            active_color: timers.running().map(color_to_string),
            probability: session.win_probability(),
            hint: session.hint().map(str::to_string),
            selected: session.selected().map(|square| square.to_string()),
            available_moves: if highlights.is_empty() { None } else { Some(highlights) },
            promotion_pending: session.promotion().pending().map(|pending| LastMove {
                from: pending.source.to_string(),
                to: pending.target.to_string(),
            }),
            last_move: projection.last_move.as_deref().and_then(LastMove::from_uci),
            reply_move: session.last_reply().map(str::to_string),
            busy: session.is_busy(),
            input_enabled: session.input_enabled(),
            dark_mode: self.store.dark_mode(),
            games: self.games.clone(),
            notice: self.notice.clone(),
            error: None,
            redirect: None,
        }
    }

    fn render(&self) {
        self.broadcast(&self.view());
    }

    fn broadcast(&self, message: &ServerMessage) {
        if self.clients.is_empty() {
            return;
        }
        let message_str = match serde_json::to_string(message) {
            Ok(s) => s,
            Err(e) => {
                warn!("Error serializing message: {}", e);
                return;
            }
        };
        for addr in self.clients.values() {
            addr.do_send(ChessWebSocketMessage(message_str.clone()));
        }
    }
}

fn submitted(outcome: GestureOutcome) -> Option<Request> {
    match outcome {
        GestureOutcome::Submitted(request) => Some(request),
        GestureOutcome::AwaitingPromotion(_) => None,
    }
}

impl Actor for SessionActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let request = match self.session.as_mut() {
            Some(session) => session.fetch_state(),
            None => return,
        };
        match request {
            Ok(request) => self.issue(request, ctx),
            Err(e) => warn!("Could not load the current game: {}", e),
        }
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        if let Some(session) = self.session.take() {
            session.teardown();
        }
    }
}

impl Handler<Command> for SessionActor {
    type Result = ();

    fn handle(&mut self, command: Command, ctx: &mut Self::Context) {
        debug!("Command: {:?}", command);
        match command {
            Command::ToggleDarkMode => self.toggle_dark_mode(),
            Command::Sync => {}
            _ if self.session.is_none() => {
                self.broadcast(&ServerMessage::redirect(self.login_url.clone()));
                return;
            }
            command => {
                self.notice = None;
                match self.handle_command(command) {
                    Ok(Some(request)) => self.issue(request, ctx),
                    Ok(None) => {}
                    Err(e) => {
                        info!("Refused: {}", e);
                        self.notice = Some(e.to_string());
                    }
                }
            }
        }
        self.sync_clock(ctx);
        self.render();
    }
}

impl Handler<Connect> for SessionActor {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Self::Context) {
        info!("Renderer {} connected", msg.id);
        let view = self.view();
        match serde_json::to_string(&view) {
            Ok(text) => msg.addr.do_send(ChessWebSocketMessage(text)),
            Err(e) => warn!("Error serializing message: {}", e),
        }
        self.clients.insert(msg.id, msg.addr);
        info!("Total connected renderers: {}", self.clients.len());
    }
}

impl Handler<Disconnect> for SessionActor {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Self::Context) {
        if self.clients.remove(&msg.id).is_some() {
            info!("Renderer {} disconnected", msg.id);
        }
    }
}

impl Handler<CurrentView> for SessionActor {
    type Result = MessageResult<CurrentView>;

    fn handle(&mut self, _: CurrentView, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.view())
    }
}
