pub mod api;
pub mod game_state;
pub mod messages;

pub use game_state::*;
pub use messages::*;
