//! Tool-call dispatch loop primitives (runs, events, stream monitoring).

pub mod events;
pub mod monitor;
pub mod runner;
pub mod types;

pub use events::*;
pub use monitor::{StreamMonitor, TurnOutcome};
pub use runner::*;
pub use types::*;
