//! Core types for relay.

pub mod call;
pub mod stream;
pub mod turn;
pub mod usage;

pub use call::*;
pub use stream::*;
pub use turn::*;
pub use usage::*;
