//! The payment tools the remote agents can call.

use std::sync::Arc;

use crate::error::RelayError;
use crate::tools::{AgentTool, FunctionRegistry, ToolParameters};

use super::ledger::PaymentLedger;
use super::models::{AccountParams, CustomerParams, LatestBillParams, PayServiceParams};

pub const LIST_FAVORITE_SERVICES: &str = "list_favorite_services";
pub const GET_BALANCE: &str = "get_balance";
pub const PAY_SERVICE: &str = "pay_service";
pub const GET_LATEST_BILL: &str = "get_latest_bill";

/// Registry with the four payment tools bound to `ledger`.
pub fn payment_registry(ledger: Arc<PaymentLedger>) -> Result<FunctionRegistry, RelayError> {
    let mut registry = FunctionRegistry::new();

    let l = Arc::clone(&ledger);
    registry.register(AgentTool::typed(
        LIST_FAVORITE_SERVICES,
        "List favorite services for a customer.",
        ToolParameters::object()
            .string("customer_id", "Customer identifier", true)
            .build(),
        move |params: CustomerParams| {
            let ledger = Arc::clone(&l);
            async move { Ok(ledger.list_favorite_services(&params.customer_id)) }
        },
    ))?;

    let l = Arc::clone(&ledger);
    registry.register(AgentTool::typed(
        GET_BALANCE,
        "Get the balance of an account.",
        ToolParameters::object()
            .string("account_id", "Account identifier", true)
            .build(),
        move |params: AccountParams| {
            let ledger = Arc::clone(&l);
            async move { Ok(ledger.get_balance(&params.account_id).await) }
        },
    ))?;

    let l = Arc::clone(&ledger);
    registry.register(AgentTool::typed(
        PAY_SERVICE,
        "Execute a payment for a service.",
        ToolParameters::object()
            .string("account_id", "Account identifier", true)
            .string("service_id", "Service identifier", true)
            .number("amount", "Payment amount", true)
            .build(),
        move |params: PayServiceParams| {
            let ledger = Arc::clone(&l);
            async move {
                Ok(ledger
                    .pay_service(&params.account_id, &params.service_id, params.amount)
                    .await)
            }
        },
    ))?;

    registry.register(AgentTool::typed(
        GET_LATEST_BILL,
        "Get the latest bill for a customer and service.",
        ToolParameters::object()
            .string("customer_id", "Customer identifier", true)
            .string("service_id", "Service identifier", true)
            .build(),
        move |params: LatestBillParams| {
            let ledger = Arc::clone(&ledger);
            async move { Ok(ledger.get_latest_bill(&params.customer_id, &params.service_id)) }
        },
    ))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> (Arc<PaymentLedger>, FunctionRegistry) {
        let ledger = Arc::new(PaymentLedger::seeded());
        let registry = payment_registry(Arc::clone(&ledger)).unwrap();
        (ledger, registry)
    }

    #[test]
    fn registers_strict_tools_in_order() {
        let (_, registry) = registry();
        let definitions = registry.definitions();

        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![LIST_FAVORITE_SERVICES, GET_BALANCE, PAY_SERVICE, GET_LATEST_BILL]);
        assert!(definitions.iter().all(|d| d.strict));
    }

    #[tokio::test]
    async fn list_returns_plain_maps() {
        let (_, registry) = registry();
        let value = registry
            .invoke(LIST_FAVORITE_SERVICES, json!({ "customer_id": "cust-2" }))
            .await
            .unwrap();

        assert_eq!(
            value,
            json!([
                { "id": "SVC003", "name": "Claro Móvil", "category": "Telefonía" },
                { "id": "SVC005", "name": "Movistar Hogar", "category": "Internet" },
            ])
        );
    }

    #[tokio::test]
    async fn pay_accepts_string_arguments() {
        let (ledger, registry) = registry();
        let value = registry
            .invoke(
                PAY_SERVICE,
                r#"{"account_id":"acct-123","service_id":"SVC002","amount":0.5}"#,
            )
            .await
            .unwrap();

        assert_eq!(value["error_message"], "");
        assert_eq!(ledger.get_balance("acct-123").await.balance, 20.0);
    }

    #[tokio::test]
    async fn missing_or_extra_arguments_are_rejected() {
        let (_, registry) = registry();

        let missing = registry
            .invoke(GET_BALANCE, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(missing, RelayError::ArgumentError { .. }));

        let extra = registry
            .invoke(GET_BALANCE, json!({ "account_id": "acct-123", "pin": "0000" }))
            .await
            .unwrap_err();
        assert!(matches!(extra, RelayError::ArgumentError { ref message, .. } if message.contains("pin")));
    }
}
