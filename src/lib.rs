//! Relay: drive remote agents that call back into local tools.
//!
//! Two pieces do the work:
//!
//! - [`agent_loop::DispatchLoop`] runs a conversation turn by turn, executing
//!   the function calls the remote side requests through a
//!   [`tools::FunctionRegistry`] and resubmitting their outputs until a turn
//!   finishes with no pending calls.
//! - [`workflow::Workflow`] runs a static graph of executors over one owned
//!   state value, where each executor either forwards along an edge or
//!   yields the run's output.
//!
//! [`payments`] wires both together for a service-payment assistant.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use relay::prelude::*;
//! use relay::payments::{payment_registry, PaymentLedger};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> relay::error::Result<()> {
//! let config = RelayConfig::load()?;
//! let provider = Arc::new(ResponsesProvider::from_config(&config)?);
//! let registry = Arc::new(payment_registry(Arc::new(PaymentLedger::seeded()))?);
//! let dispatch = DispatchLoop::new(provider, registry);
//!
//! let request = DispatchRequest::builder()
//!     .conversation_id("conv_123")
//!     .agent("service-payment-workflow")
//!     .input("cuales son mis servicios favoritos")
//!     .build();
//! let summary = dispatch.run(request, &CancellationToken::new()).await?;
//! println!("{}", summary.final_text);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod payments;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;
pub mod workflow;

#[cfg(feature = "cli")]
pub mod cli;
