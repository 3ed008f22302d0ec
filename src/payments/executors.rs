//! The five steps of the payment workflow.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::models::{
    BalanceResult, PaymentConfirmationResult, PaymentExecutionResult, ServiceSelectionResult,
};
use super::state::PaymentState;
use crate::agent::{parse_structured, RemoteAgent, StructuredResult};
use crate::error::RelayError;
use crate::workflow::{clarify, Clarified, Executor, Next, WorkflowContext};

pub const SELECT_SERVICE: &str = "select_service";
pub const GET_BALANCE: &str = "get_balance";
pub const CONFIRM_PAYMENT: &str = "confirm_payment";
pub const DECISION: &str = "decision";
pub const PAY: &str = "pay";

pub const PAYMENT_DECLINED: &str = "Entendido, no realizo el pago. ¿Quieres pagar otro servicio?";
pub const AMOUNT_NOT_POSITIVE: &str = "El monto debe ser mayor que 0. No se pudo procesar el pago.";

fn inputs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Invoke a single-shot agent, show its reply, and parse it.
async fn invoke_once<T: StructuredResult>(
    agent: &RemoteAgent,
    ctx: &WorkflowContext,
    structured_inputs: Map<String, Value>,
) -> Result<T, RelayError> {
    let summary = agent
        .invoke(ctx.conversation_id(), "", Some(structured_inputs), ctx.cancel_token())
        .await?;
    ctx.status(format!("{}: {}", agent.name(), summary.final_text));
    parse_structured(&summary.final_text)
}

fn exhausted(step: &str, rounds: u32) -> String {
    format!("No se pudo completar {step} después de {rounds} intentos. ¿Quieres empezar de nuevo?")
}

/// Picks the service to pay from the customer's favourites.
pub struct ServiceSelectionExecutor {
    agent: RemoteAgent,
    max_rounds: u32,
}

impl ServiceSelectionExecutor {
    pub fn new(agent: RemoteAgent, max_rounds: u32) -> Self {
        Self { agent, max_rounds }
    }
}

#[async_trait]
impl Executor<PaymentState> for ServiceSelectionExecutor {
    fn id(&self) -> &str {
        SELECT_SERVICE
    }

    async fn handle(&self, state: &mut PaymentState, ctx: &mut WorkflowContext) -> Result<Next, RelayError> {
        let structured = inputs(json!({ "CustomerId": state.customer_id }));
        let outcome = clarify::<ServiceSelectionResult>(
            &self.agent,
            ctx,
            state.user_message.clone(),
            structured,
            self.max_rounds,
        )
        .await?;

        match outcome {
            Clarified::Complete(selection) => {
                state.service_selection = Some(selection);
                Ok(Next::Continue)
            }
            Clarified::Stopped { message } => Ok(Next::Yield(message)),
            Clarified::Exhausted { rounds, .. } => {
                Ok(Next::Yield(exhausted("la selección del servicio", rounds)))
            }
        }
    }
}

/// Reads the paying account's balance.
pub struct BalanceExecutor {
    agent: RemoteAgent,
}

impl BalanceExecutor {
    pub fn new(agent: RemoteAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Executor<PaymentState> for BalanceExecutor {
    fn id(&self) -> &str {
        GET_BALANCE
    }

    async fn handle(&self, state: &mut PaymentState, ctx: &mut WorkflowContext) -> Result<Next, RelayError> {
        let structured = inputs(json!({ "AccountId": state.account_id }));
        let balance: BalanceResult = invoke_once(&self.agent, ctx, structured).await?;

        if !balance.is_complete() {
            let message = format!(
                "No se pudo obtener el saldo: {}\nNo se realizó el pago.",
                balance.error_message
            );
            state.balance = Some(balance);
            return Ok(Next::Yield(message));
        }
        state.balance = Some(balance);
        Ok(Next::Continue)
    }
}

/// Shows the latest bill and asks the user to confirm an amount.
pub struct ConfirmationExecutor {
    agent: RemoteAgent,
    max_rounds: u32,
}

impl ConfirmationExecutor {
    pub fn new(agent: RemoteAgent, max_rounds: u32) -> Self {
        Self { agent, max_rounds }
    }
}

#[async_trait]
impl Executor<PaymentState> for ConfirmationExecutor {
    fn id(&self) -> &str {
        CONFIRM_PAYMENT
    }

    async fn handle(&self, state: &mut PaymentState, ctx: &mut WorkflowContext) -> Result<Next, RelayError> {
        let (Some(selection), Some(balance)) = (&state.service_selection, &state.balance) else {
            return Err(RelayError::contract("Missing required data"));
        };
        let structured = inputs(json!({
            "CustomerId": state.customer_id,
            "ServiceId": selection.service_id,
            "ServiceName": selection.service_name,
            "Balance": balance.balance,
            "Currency": balance.currency,
        }));

        let outcome = clarify::<PaymentConfirmationResult>(
            &self.agent,
            ctx,
            String::new(),
            structured,
            self.max_rounds,
        )
        .await?;

        match outcome {
            Clarified::Complete(confirmation) => {
                if confirmation.service_id != selection.service_id {
                    tracing::warn!(
                        selected = %selection.service_id,
                        confirmed = %confirmation.service_id,
                        "confirmation echoes a different service"
                    );
                }
                state.confirmation = Some(confirmation);
                Ok(Next::Continue)
            }
            Clarified::Stopped { message } => Ok(Next::Yield(message)),
            Clarified::Exhausted { rounds, .. } => {
                Ok(Next::Yield(exhausted("la confirmación del pago", rounds)))
            }
        }
    }
}

/// Local checks between confirmation and payment. Never calls a remote agent.
#[derive(Debug, Default)]
pub struct DecisionExecutor;

#[async_trait]
impl Executor<PaymentState> for DecisionExecutor {
    fn id(&self) -> &str {
        DECISION
    }

    async fn handle(&self, state: &mut PaymentState, _ctx: &mut WorkflowContext) -> Result<Next, RelayError> {
        let Some(confirmation) = &state.confirmation else {
            return Err(RelayError::contract("No confirmation data"));
        };
        if !confirmation.confirmed {
            return Ok(Next::Yield(PAYMENT_DECLINED.to_string()));
        }
        if confirmation.amount <= 0.0 {
            return Ok(Next::Yield(AMOUNT_NOT_POSITIVE.to_string()));
        }
        let Some(balance) = &state.balance else {
            return Err(RelayError::contract("No balance data"));
        };
        if confirmation.amount > balance.balance {
            return Ok(Next::Yield(format!(
                "❌ Fondos insuficientes: El monto a pagar ({:.2} {currency}) \n\
                 es mayor que tu saldo disponible ({:.2} {currency}).\n\
                 No se realizó el pago. ¿Deseas pagar otro servicio?",
                confirmation.amount,
                balance.balance,
                currency = balance.currency,
            )));
        }
        Ok(Next::Continue)
    }
}

/// Executes the confirmed payment and reports the receipt.
pub struct PaymentExecutor {
    agent: RemoteAgent,
}

impl PaymentExecutor {
    pub fn new(agent: RemoteAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Executor<PaymentState> for PaymentExecutor {
    fn id(&self) -> &str {
        PAY
    }

    async fn handle(&self, state: &mut PaymentState, ctx: &mut WorkflowContext) -> Result<Next, RelayError> {
        let (Some(confirmation), Some(selection)) = (&state.confirmation, &state.service_selection) else {
            return Err(RelayError::contract("Missing payment data"));
        };
        let structured = inputs(json!({
            "AccountId": state.account_id,
            "ServiceId": selection.service_id,
            "Amount": confirmation.amount,
        }));

        let payment: PaymentExecutionResult = invoke_once(&self.agent, ctx, structured).await?;
        let message = if payment.is_complete() {
            let receipt_id = if payment.receipt_id.is_empty() {
                "N/A"
            } else {
                payment.receipt_id.as_str()
            };
            format!(
                "✅ Pago confirmado — ReceiptId: {receipt_id}\n{}\n¿Deseas realizar otro pago?",
                payment.receipt_details
            )
        } else {
            format!(
                "❌ No se pudo realizar el pago: {}\n¿Deseas intentar con otro servicio?",
                payment.error_message
            )
        };
        state.payment = Some(payment);
        Ok(Next::Yield(message))
    }
}
