//! Tests for core types.

use pretty_assertions::assert_eq;
use relay::types::*;
use serde_json::json;

#[test]
fn message_item_carries_producing_agent() {
    let event: TurnEvent = serde_json::from_value(json!({
        "type": "response.output_item.added",
        "item": {
            "type": "message",
            "id": "msg_1",
            "role": "assistant",
            "created_by": { "agent": { "name": "PayServiceAgent", "version": "3" } }
        }
    }))
    .unwrap();

    let TurnEvent::ItemAdded { item } = event else {
        panic!("expected item added");
    };
    assert_eq!(item.agent_name().as_deref(), Some("PayServiceAgent"));
}

#[test]
fn workflow_action_items_parse() {
    let item: OutputItem = serde_json::from_value(json!({
        "type": "workflow_action",
        "action_id": "select_service",
        "status": "in_progress"
    }))
    .unwrap();

    assert_eq!(
        item,
        OutputItem::WorkflowAction {
            action_id: "select_service".into(),
            status: Some("in_progress".into()),
        }
    );
    assert!(item.completed_call().is_none());
    assert_eq!(item.agent_name(), None);
}

#[test]
fn failed_event_exposes_error_detail() {
    let event: TurnEvent = serde_json::from_value(json!({
        "type": "response.failed",
        "response": { "status": "failed", "error": { "code": "rate_limit_exceeded", "message": "slow down" } }
    }))
    .unwrap();

    let TurnEvent::Failed { response } = event else {
        panic!("expected failure");
    };
    let error = response.error.unwrap();
    assert_eq!(error.code.as_deref(), Some("rate_limit_exceeded"));
    assert_eq!(error.message, "slow down");
}

#[test]
fn usage_merge() {
    let mut total = Usage::default();
    for (input, output) in [(10, 2), (30, 5)] {
        total.merge(&Usage {
            input_tokens: input,
            output_tokens: output,
            total_tokens: input + output,
        });
    }

    assert_eq!(
        total,
        Usage {
            input_tokens: 40,
            output_tokens: 7,
            total_tokens: 47,
        }
    );
}

#[test]
fn outputs_turn_round_trips_through_wire_shape() {
    let request = TurnRequest::new(
        "conv_1",
        AgentReference::new("service-payment-workflow"),
        TurnInput::FunctionOutputs(vec![
            FunctionCallOutput::new("call_1", &json!({ "balance": 20.5 })),
            FunctionCallOutput::error("call_2", "ledger offline"),
        ]),
    )
    .with_structured_inputs(Some(
        json!({ "AccountId": "acct-123" }).as_object().cloned().unwrap(),
    ));

    let wire = serde_json::to_value(&request).unwrap();
    assert_eq!(wire["input"][1]["output"], r#"{"error":"ledger offline"}"#);
    assert_eq!(wire["structured_inputs"]["AccountId"], "acct-123");

    let back: TurnRequest = serde_json::from_value(wire).unwrap();
    assert_eq!(back, request);
}
