// Game decisions on top of the device and vision layers
pub mod dispatcher;
pub mod match_engine;
pub mod queue;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use dispatcher::{Reconnect, dispatch, run, run_reconnecting, step};
pub use match_engine::{MatchEnd, TickAction, run_match, tick};
pub use queue::{QueueOutcome, negotiate};
pub use session::Session;
pub use state::{ApplicationState, Classification, PRIORITY, classify, detect};
