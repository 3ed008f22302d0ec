//! State threaded through one run of the payment workflow.

use super::models::{
    BalanceResult, PaymentConfirmationResult, PaymentExecutionResult, ServiceSelectionResult,
};

/// Owned by a single run; each executor fills in its own result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentState {
    pub user_message: String,
    pub customer_id: String,
    pub account_id: String,
    pub service_selection: Option<ServiceSelectionResult>,
    pub balance: Option<BalanceResult>,
    pub confirmation: Option<PaymentConfirmationResult>,
    pub payment: Option<PaymentExecutionResult>,
}

impl PaymentState {
    pub fn new(
        user_message: impl Into<String>,
        customer_id: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            customer_id: customer_id.into(),
            account_id: account_id.into(),
            ..Self::default()
        }
    }
}
