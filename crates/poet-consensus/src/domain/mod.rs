//! Domain layer for PoET consensus

mod block;
mod consensus_state;
mod error;
mod key_state;
mod validator;

pub use block::*;
pub use consensus_state::*;
pub use error::*;
pub use key_state::*;
pub use validator::*;
