pub mod history;
pub mod mirror;
pub mod promotion;
pub mod timer;
pub mod utils;

pub use history::{Cursor, MoveHistory, Navigation, Projection};
pub use mirror::{AuthoritativeUpdate, LocalMirror};
pub use promotion::PromotionState;
pub use timer::{TickOutcome, TimeControl, TimerCoordinator};
