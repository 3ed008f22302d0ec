//! End-to-end runs of the payment workflow against scripted remote agents.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use common::*;
use relay::agent_loop::{DispatchLoop, LoopPolicy};
use relay::config::RelayConfig;
use relay::error::RelayError;
use relay::payments::{payment_registry, payment_workflow, PaymentAgents, PaymentLedger};
use relay::workflow::{OutputKind, RunOptions, ScriptedClarifier, WorkflowEvent};

struct Fixture {
    provider: Arc<ScriptedProvider>,
    ledger: Arc<PaymentLedger>,
    workflow: relay::workflow::Workflow<relay::payments::PaymentState>,
}

fn fixture(provider: ScriptedProvider) -> Fixture {
    let provider = Arc::new(provider);
    let ledger = Arc::new(PaymentLedger::seeded());
    let registry = Arc::new(payment_registry(Arc::clone(&ledger)).unwrap());
    let dispatch = DispatchLoop::new(provider.clone(), registry).with_policy(LoopPolicy {
        max_turns: 4,
        turn_timeout: Duration::from_secs(5),
        transient_retries: 0,
    });
    let workflow = payment_workflow(PaymentAgents::new(dispatch), &RelayConfig::default()).unwrap();
    Fixture {
        provider,
        ledger,
        workflow,
    }
}

fn selection(complete: bool, message: &str) -> Value {
    json!({
        "IsComplete": complete,
        "ServiceId": if complete { "SVC001" } else { "" },
        "ServiceName": if complete { "Luz del Sur" } else { "" },
        "UserMessage": message,
    })
}

fn balance() -> Value {
    json!({ "Balance": 20.5, "Currency": "S/.", "ErrorMessage": "" })
}

fn confirmation(confirmed: bool, amount: f64) -> Value {
    json!({
        "IsComplete": true,
        "Confirmed": confirmed,
        "Amount": amount,
        "ServiceId": "SVC001",
        "UserMessage": "",
    })
}

/// Scripted turns up to and including the confirmation step.
fn through_confirmation(amount: f64) -> ScriptedProvider {
    ScriptedProvider::new()
        .then_events(call_turn(&[("call_fav", "list_favorite_services", json!({ "customer_id": "cust-1" }))]))
        .then_events(json_turn("ServiceSelectionAgent", selection(true, "")))
        .then_events(call_turn(&[("call_bal", "get_balance", json!({ "account_id": "acct-123" }))]))
        .then_events(json_turn("GetBalanceAgent", balance()))
        .then_events(call_turn(&[(
            "call_bill",
            "get_latest_bill",
            json!({ "customer_id": "cust-1", "service_id": "SVC001" }),
        )]))
        .then_events(json_turn("LatestBillAndConfirmationAgent", confirmation(true, amount)))
}

fn agents_addressed(provider: &ScriptedProvider) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for request in provider.requests() {
        if names.last() != Some(&request.agent.name) {
            names.push(request.agent.name.clone());
        }
    }
    names
}

#[tokio::test]
async fn confirmed_payment_debits_the_account() {
    let f = fixture(
        through_confirmation(15.0)
            .then_events(call_turn(&[(
                "call_pay",
                "pay_service",
                json!({ "account_id": "acct-123", "service_id": "SVC001", "amount": 15.0 }),
            )]))
            .then_events(json_turn(
                "PayServiceAgent",
                json!({
                    "ReceiptId": "RCP-0A1B2C3D4E5F",
                    "ReceiptDetails": "Pago de 15.00 S/. a Luz del Sur realizado exitosamente.",
                    "ErrorMessage": "",
                }),
            )),
    );

    let output = f
        .workflow
        .run("quiero pagar la luz", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(output.kind, OutputKind::Final);
    assert_eq!(output.executor_id, "pay");
    assert_eq!(
        output.steps,
        vec!["select_service", "get_balance", "confirm_payment", "decision", "pay"]
    );
    assert!(output.text.starts_with("✅ Pago confirmado"));
    assert!(output.text.contains("RCP-0A1B2C3D4E5F"));

    let requests = f.provider.requests();
    let pay_output = output_for(&requests[7], "call_pay");
    let receipt_id = pay_output["receipt_id"].as_str().unwrap();
    assert!(regex::Regex::new(r"^RCP-[0-9A-F]{12}$").unwrap().is_match(receipt_id));
    assert_eq!(f.ledger.get_balance("acct-123").await.balance, 5.5);
    assert!(f.ledger.receipt(receipt_id).is_some());

    assert_eq!(requests[0].input, relay::types::TurnInput::Text("quiero pagar la luz".into()));
    assert_eq!(
        requests[2].structured_inputs.as_ref().unwrap()["AccountId"],
        json!("acct-123")
    );
    assert_eq!(
        requests[4].structured_inputs.as_ref().unwrap()["Balance"],
        json!(20.5)
    );
    assert_eq!(
        agents_addressed(&f.provider),
        vec![
            "ServiceSelectionAgent",
            "GetBalanceAgent",
            "LatestBillAndConfirmationAgent",
            "PayServiceAgent",
        ]
    );
}

#[tokio::test]
async fn amount_above_balance_stops_at_decision() {
    let f = fixture(through_confirmation(100.0));

    let output = f.workflow.run("pagar luz", RunOptions::default()).await.unwrap();

    assert_eq!(output.executor_id, "decision");
    assert!(output.text.starts_with("❌ Fondos insuficientes"));
    assert!(output.text.contains("100.00 S/."));
    assert_eq!(f.ledger.get_balance("acct-123").await.balance, 20.5);
    assert_eq!(f.ledger.receipt_count(), 0);
    assert!(!agents_addressed(&f.provider).contains(&"PayServiceAgent".to_string()));
}

#[tokio::test]
async fn declined_confirmation_never_pays() {
    let provider = ScriptedProvider::new()
        .then_events(json_turn("ServiceSelectionAgent", selection(true, "")))
        .then_events(json_turn("GetBalanceAgent", balance()))
        .then_events(json_turn("LatestBillAndConfirmationAgent", confirmation(false, 15.0)));
    let f = fixture(provider);

    let output = f.workflow.run("pagar luz", RunOptions::default()).await.unwrap();

    assert_eq!(output.executor_id, "decision");
    assert!(output.text.starts_with("Entendido, no realizo el pago"));
    assert_eq!(f.provider.remaining(), 0);
}

#[tokio::test]
async fn clarification_reply_feeds_the_next_round() {
    let clarifier = Arc::new(ScriptedClarifier::new(["Luz del Sur"]));
    let f = fixture(
        ScriptedProvider::new()
            .then_events(json_turn(
                "ServiceSelectionAgent",
                selection(false, "¿Qué servicio deseas pagar?"),
            ))
            .then_events(json_turn("ServiceSelectionAgent", selection(true, "")))
            .then_events(json_turn("GetBalanceAgent", balance()))
            .then_events(json_turn("LatestBillAndConfirmationAgent", confirmation(false, 0.0))),
    );

    let options = RunOptions::builder().clarifier(clarifier.clone()).build();
    let output = f.workflow.run("quiero pagar", options).await.unwrap();

    assert_eq!(output.executor_id, "decision");
    assert_eq!(clarifier.prompts(), vec!["¿Qué servicio deseas pagar?"]);
    let requests = f.provider.requests();
    assert_eq!(requests[1].input, relay::types::TurnInput::Text("Luz del Sur".into()));
    assert_eq!(requests[0].conversation_id, requests[1].conversation_id);
}

#[tokio::test]
async fn without_a_clarifier_the_question_is_the_output() {
    let f = fixture(ScriptedProvider::new().then_events(json_turn(
        "ServiceSelectionAgent",
        selection(false, "¿Qué servicio deseas pagar?"),
    )));

    let output = f.workflow.run("quiero pagar", RunOptions::default()).await.unwrap();

    assert_eq!(output.kind, OutputKind::Final);
    assert_eq!(output.executor_id, "select_service");
    assert_eq!(output.text, "¿Qué servicio deseas pagar?");
}

#[tokio::test]
async fn clarification_rounds_are_bounded() {
    let clarifier = Arc::new(ScriptedClarifier::new(["no sé", "tampoco", "nada"]));
    let f = fixture(ScriptedProvider::repeating(json_turn(
        "ServiceSelectionAgent",
        selection(false, "¿Qué servicio?"),
    )));

    let options = RunOptions::builder().clarifier(clarifier.clone()).build();
    let output = f.workflow.run("pagar", options).await.unwrap();

    assert_eq!(
        output.text,
        "No se pudo completar la selección del servicio después de 3 intentos. ¿Quieres empezar de nuevo?"
    );
    assert_eq!(f.provider.requests().len(), 3);
    assert_eq!(clarifier.prompts().len(), 2);
}

#[tokio::test]
async fn malformed_agent_result_becomes_a_diagnostic() {
    let f = fixture(
        ScriptedProvider::new()
            .then_events(json_turn("ServiceSelectionAgent", selection(true, "")))
            .then_events(json_turn("GetBalanceAgent", json!({ "Balance": 20.5 }))),
    );

    let output = f.workflow.run("pagar luz", RunOptions::default()).await.unwrap();

    assert_eq!(output.kind, OutputKind::Diagnostic);
    assert_eq!(output.executor_id, "get_balance");
    assert!(output.text.starts_with("Error: BalanceResult does not match its contract"));
}

#[tokio::test]
async fn cancelled_run_fails_without_contacting_agents() {
    let f = fixture(ScriptedProvider::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = f
        .workflow
        .run("pagar", RunOptions::builder().cancel(cancel).build())
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Cancelled));
    assert!(f.provider.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_an_agent_turn_stops_before_payment() {
    let f = fixture(
        ScriptedProvider::new()
            .then_events(json_turn("ServiceSelectionAgent", selection(true, "")))
            .then(Step::Hang),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let events: Vec<WorkflowEvent> = f
        .workflow
        .run_stream("pagar luz", RunOptions::builder().cancel(cancel).build())
        .collect()
        .await;

    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Failed { cancelled: true, .. })
    ));
    let started: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::ExecutorStarted { executor_id } => Some(executor_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["select_service", "get_balance"]);
    assert!(!events.iter().any(|e| matches!(e, WorkflowEvent::Output { .. })));
    assert_eq!(f.provider.requests().len(), 2);
    assert_eq!(f.ledger.get_balance("acct-123").await.balance, 20.5);
    assert_eq!(f.ledger.receipt_count(), 0);
}

#[tokio::test]
async fn stream_reports_progress_then_output() {
    let f = fixture(
        ScriptedProvider::new()
            .then_events(json_turn("ServiceSelectionAgent", selection(true, "Elegiste Luz del Sur")))
            .then_events(json_turn("GetBalanceAgent", balance()))
            .then_events(json_turn("LatestBillAndConfirmationAgent", confirmation(false, 15.0))),
    );
    let forwarded = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&forwarded);
    let options = RunOptions::builder()
        .sink(Arc::new(move |_event: WorkflowEvent| *counter.lock().unwrap() += 1))
        .build();

    let events: Vec<WorkflowEvent> = f.workflow.run_stream("pagar luz", options).collect().await;

    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::Status { message: Some(m), .. } if m == "ServiceSelectionAgent: Elegiste Luz del Sur"
    )));
    let outputs: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::Output { output } => Some(output.executor_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(outputs, vec!["decision"]);
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Status {
            phase: relay::workflow::RunPhase::Completed,
            ..
        })
    ));
    assert_eq!(*forwarded.lock().unwrap(), events.len());
}
