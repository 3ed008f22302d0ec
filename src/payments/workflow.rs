//! Wiring the payment executors into a workflow.

use crate::agent::RemoteAgent;
use crate::agent_loop::DispatchLoop;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::workflow::{Workflow, WorkflowBuilder};

use super::executors::{
    BalanceExecutor, ConfirmationExecutor, DecisionExecutor, PaymentExecutor,
    ServiceSelectionExecutor, CONFIRM_PAYMENT, DECISION, GET_BALANCE, PAY, SELECT_SERVICE,
};
use super::state::PaymentState;

pub const SERVICE_SELECTION_AGENT: &str = "ServiceSelectionAgent";
pub const GET_BALANCE_AGENT: &str = "GetBalanceAgent";
pub const CONFIRMATION_AGENT: &str = "LatestBillAndConfirmationAgent";
pub const PAY_SERVICE_AGENT: &str = "PayServiceAgent";

/// The four remote agents the payment workflow talks to.
#[derive(Debug, Clone)]
pub struct PaymentAgents {
    pub service_selection: RemoteAgent,
    pub balance: RemoteAgent,
    pub confirmation: RemoteAgent,
    pub payment: RemoteAgent,
}

impl PaymentAgents {
    /// The standard agents, all driven by `dispatch` (which should carry the
    /// payment tool registry).
    pub fn new(dispatch: DispatchLoop) -> Self {
        Self {
            service_selection: RemoteAgent::new(SERVICE_SELECTION_AGENT, dispatch.clone()),
            balance: RemoteAgent::new(GET_BALANCE_AGENT, dispatch.clone()),
            confirmation: RemoteAgent::new(CONFIRMATION_AGENT, dispatch.clone()),
            payment: RemoteAgent::new(PAY_SERVICE_AGENT, dispatch),
        }
    }
}

/// `select_service -> get_balance -> confirm_payment -> decision -> pay`.
///
/// Each run starts from the customer and account configured in `config`.
pub fn payment_workflow(
    agents: PaymentAgents,
    config: &RelayConfig,
) -> Result<Workflow<PaymentState>, RelayError> {
    let rounds = config.max_clarification_rounds;
    let customer_id = config.customer_id.clone();
    let account_id = config.account_id.clone();

    WorkflowBuilder::new()
        .add_executor(ServiceSelectionExecutor::new(agents.service_selection, rounds))
        .add_executor(BalanceExecutor::new(agents.balance))
        .add_executor(ConfirmationExecutor::new(agents.confirmation, rounds))
        .add_executor(DecisionExecutor)
        .add_executor(PaymentExecutor::new(agents.payment))
        .add_edge(SELECT_SERVICE, GET_BALANCE)
        .add_edge(GET_BALANCE, CONFIRM_PAYMENT)
        .add_edge(CONFIRM_PAYMENT, DECISION)
        .add_edge(DECISION, PAY)
        .set_start(SELECT_SERVICE)
        .with_state(move |input| PaymentState::new(input, customer_id.as_str(), account_id.as_str()))
        .build()
}
