use chess::Piece;
use std::path::PathBuf;

/// Failures reported by (or while talking to) the remote authority.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthorityError {
    /// The authority understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    /// The signed-in session is missing or expired on the server.
    #[error("session is no longer authenticated")]
    Unauthenticated,

    /// The request never completed (connection, timeout, 5xx without body).
    #[error("request failed: {0}")]
    Transport(String),

    /// The authority answered with something we could not decode.
    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Failures of the persisted client-side key/value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt client state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Everything a session operation can refuse with.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no signed-in identity")]
    Unauthenticated,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("a request is already in flight")]
    Busy,

    #[error("waiting for a promotion choice")]
    PromotionPending,

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("move {0} needs a promotion piece")]
    MissingPromotion(String),

    #[error("cannot promote to {0:?}")]
    InvalidPromotionPiece(Piece),

    #[error("move input is disabled: {0}")]
    InputDisabled(String),

    #[error("return to the live position before moving")]
    ViewingHistory,

    #[error("invalid position: {0}")]
    MalformedPosition(String),

    #[error("history contains an unplayable move: {0}")]
    CorruptHistory(String),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;
