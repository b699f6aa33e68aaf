use log::{debug, info};

use crate::authority::AuthorityCall;
use crate::error::{SessionError, SessionResult};

/// What kind of request currently holds the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    FetchState,
    Move,
    Reset,
    Resume,
    Hint,
    Save,
    ListGames,
    Logout,
}

impl RequestKind {
    /// Requests whose success starts a new game for the clocks
    pub fn starts_game(self) -> bool {
        matches!(self, RequestKind::FetchState | RequestKind::Reset | RequestKind::Resume)
    }
}

/// A call ready to go out, tagged with the sequence number its response
/// must carry back.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub seq: u64,
    pub call: AuthorityCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub seq: u64,
    pub kind: RequestKind,
}

/// Single-slot request pipeline.
///
/// At most one request is in flight. Responses are matched by sequence
/// number; anything that does not match the current slot is stale.
#[derive(Debug, Default)]
pub struct Pipeline {
    next_seq: u64,
    in_flight: Option<InFlight>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn acquire(&mut self, kind: RequestKind) -> SessionResult<u64> {
        if let Some(current) = self.in_flight {
            debug!("Refusing {:?} while request #{} ({:?}) is in flight", kind, current.seq, current.kind);
            return Err(SessionError::Busy);
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight = Some(InFlight { seq, kind });
        Ok(seq)
    }

    /// Free the slot if `seq` is the request holding it.
    pub fn release(&mut self, seq: u64) -> Option<RequestKind> {
        match self.in_flight {
            Some(current) if current.seq == seq => {
                self.in_flight = None;
                Some(current.kind)
            }
            _ => {
                info!("Discarding stale response #{}", seq);
                None
            }
        }
    }

    /// Forget whatever is in flight; its response will be treated as stale.
    pub fn abandon(&mut self) -> Option<InFlight> {
        self.in_flight.take()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}
