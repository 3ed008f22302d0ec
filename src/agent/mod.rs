//! Remote agents and the typed results they return.

pub mod remote;
pub mod structured;

pub use remote::RemoteAgent;
pub use structured::{parse_structured, StructuredResult};
