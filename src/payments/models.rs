//! Records exchanged by the payment tools and the payment agents.

use serde::{Deserialize, Serialize};

use crate::agent::StructuredResult;

/// Currency of every mock account.
pub const DEFAULT_CURRENCY: &str = "S/.";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountInfo {
    pub id: String,
    pub balance: f64,
    pub currency: String,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            balance: 0.0,
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BalanceInfo {
    pub balance: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentResult {
    pub receipt_id: String,
    pub receipt_details: String,
    pub error_message: String,
}

impl PaymentResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiptInfo {
    pub receipt_id: String,
    pub account_id: String,
    pub service_id: String,
    pub service_name: String,
    pub amount: f64,
    pub currency: String,
    pub timestamp: String,
}

impl Default for ReceiptInfo {
    fn default() -> Self {
        Self {
            receipt_id: String::new(),
            account_id: String::new(),
            service_id: String::new(),
            service_name: String::new(),
            amount: 0.0,
            currency: default_currency(),
            timestamp: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillInfo {
    pub bill_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub service_name: String,
    pub amount: f64,
    pub currency: String,
    pub due_date: String,
    pub period: String,
    /// `Pendiente`, `Vencido` or `Pagado`.
    pub status: String,
    pub error_message: String,
}

impl Default for BillInfo {
    fn default() -> Self {
        Self {
            bill_id: String::new(),
            customer_id: String::new(),
            service_id: String::new(),
            service_name: String::new(),
            amount: 0.0,
            currency: default_currency(),
            due_date: String::new(),
            period: String::new(),
            status: String::new(),
            error_message: String::new(),
        }
    }
}

// Tool parameters.

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerParams {
    pub customer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountParams {
    pub account_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayServiceParams {
    pub account_id: String,
    pub service_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestBillParams {
    pub customer_id: String,
    pub service_id: String,
}

// Structured agent results. Every field is required and nothing else is
// accepted.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct ServiceSelectionResult {
    /// A single service has been chosen.
    pub is_complete: bool,
    pub service_id: String,
    pub service_name: String,
    pub user_message: String,
}

impl StructuredResult for ServiceSelectionResult {
    const NAME: &'static str = "ServiceSelectionResult";

    fn is_complete(&self) -> bool {
        self.is_complete
    }

    fn user_message(&self) -> &str {
        &self.user_message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct BalanceResult {
    pub balance: f64,
    pub currency: String,
    /// Non-empty when the balance lookup failed.
    pub error_message: String,
}

impl StructuredResult for BalanceResult {
    const NAME: &'static str = "BalanceResult";

    fn is_complete(&self) -> bool {
        self.error_message.is_empty()
    }

    fn user_message(&self) -> &str {
        &self.error_message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct PaymentConfirmationResult {
    /// The confirmation exchange is over, whether confirmed or declined.
    pub is_complete: bool,
    pub confirmed: bool,
    /// Zero until the user names an amount.
    pub amount: f64,
    pub service_id: String,
    pub user_message: String,
}

impl StructuredResult for PaymentConfirmationResult {
    const NAME: &'static str = "PaymentConfirmationResult";

    fn is_complete(&self) -> bool {
        self.is_complete
    }

    fn user_message(&self) -> &str {
        &self.user_message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct PaymentExecutionResult {
    pub receipt_id: String,
    pub receipt_details: String,
    pub error_message: String,
}

impl StructuredResult for PaymentExecutionResult {
    const NAME: &'static str = "PaymentExecutionResult";

    fn is_complete(&self) -> bool {
        self.error_message.is_empty()
    }

    fn user_message(&self) -> &str {
        &self.error_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bill_preserves_declared_fields_through_plain_map() {
        let bill = BillInfo {
            bill_id: "BILL-002".into(),
            customer_id: "cust-1".into(),
            service_id: "SVC002".into(),
            service_name: "Sedapal".into(),
            amount: 42.30,
            period: "Noviembre 2025".into(),
            status: "Pendiente".into(),
            ..BillInfo::default()
        };

        let value = serde_json::to_value(&bill).unwrap();
        assert_eq!(value["currency"], "S/.");
        assert_eq!(value["error_message"], "");
        assert_eq!(serde_json::from_value::<BillInfo>(value).unwrap(), bill);
    }

    #[test]
    fn balance_info_defaults_currency() {
        let info: BalanceInfo = serde_json::from_value(json!({ "balance": 1.5 })).unwrap();
        assert_eq!(info.currency, "S/.");
        assert_eq!(info.error_message, "");
    }

    #[test]
    fn confirmation_uses_pascal_case_fields() {
        let result: PaymentConfirmationResult = serde_json::from_value(json!({
            "IsComplete": true,
            "Confirmed": true,
            "Amount": 15.0,
            "ServiceId": "SVC001",
            "UserMessage": "Confirmado",
        }))
        .unwrap();
        assert!(result.confirmed);
        assert_eq!(result.amount, 15.0);
    }

    #[test]
    fn balance_result_is_complete_without_error() {
        let ok = BalanceResult {
            balance: 20.5,
            currency: "S/.".into(),
            error_message: String::new(),
        };
        assert!(ok.is_complete());

        let failed = BalanceResult {
            error_message: "Account acct-999 not found.".into(),
            ..ok
        };
        assert!(!failed.is_complete());
        assert_eq!(failed.user_message(), "Account acct-999 not found.");
    }
}
