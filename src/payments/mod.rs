//! Service-payment domain: mock ledger, tools and the payment workflow.

pub mod executors;
pub mod ledger;
pub mod models;
pub mod state;
pub mod tools;
pub mod workflow;

pub use ledger::PaymentLedger;
pub use models::{
    BalanceInfo, BalanceResult, BillInfo, PaymentConfirmationResult, PaymentExecutionResult,
    PaymentResult, ReceiptInfo, ServiceInfo, ServiceSelectionResult,
};
pub use state::PaymentState;
pub use tools::payment_registry;
pub use workflow::{payment_workflow, PaymentAgents};
