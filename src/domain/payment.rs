use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provider state reported for an approved payment.
pub const STATE_APPROVED: &str = "approved";

/// What the shop asks the provider to charge.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub cancel_url: String,
    pub success_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPayment {
    pub payment_id: String,
    pub approval_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedPayment {
    pub payment_id: String,
    pub state: String,
}

impl ExecutedPayment {
    pub fn is_approved(&self) -> bool {
        self.state == STATE_APPROVED
    }
}
