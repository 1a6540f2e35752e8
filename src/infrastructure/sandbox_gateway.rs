use crate::domain::payment::{CreatedPayment, ExecutedPayment, PaymentRequest, STATE_APPROVED};
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub const SANDBOX_APPROVAL_URL: &str = "https://www.sandbox.paypal.com/checkoutnow";
pub const STATE_FAILED: &str = "failed";

#[derive(Debug, Clone)]
struct SandboxPayment {
    amount: Decimal,
    currency: String,
    executed: bool,
}

/// A deterministic stand-in for the PayPal REST API.
///
/// Payment ids are `PAYID-00000001`, `PAYID-00000002`, ... in creation
/// order. Executing an unknown or already executed payment fails like the
/// real provider does; payers listed as declined get state `failed`.
#[derive(Default)]
pub struct SandboxGateway {
    payments: Mutex<HashMap<String, SandboxPayment>>,
    issued: AtomicU64,
    declined_payers: HashSet<String>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_declined_payers(payers: impl IntoIterator<Item = String>) -> Self {
        Self {
            declined_payers: payers.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment> {
        if request.amount <= Decimal::ZERO {
            return Err(ShopError::PaymentProvider(format!(
                "VALIDATION_ERROR: amount must be positive, got {}",
                request.amount
            )));
        }

        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let payment_id = format!("PAYID-{sequence:08}");
        let approval_url = format!("{SANDBOX_APPROVAL_URL}?token=EC-{sequence:08}");

        self.payments.lock().await.insert(
            payment_id.clone(),
            SandboxPayment {
                amount: request.amount,
                currency: request.currency,
                executed: false,
            },
        );
        tracing::info!(%payment_id, description = %request.description, "sandbox payment created");

        Ok(CreatedPayment {
            payment_id,
            approval_url,
        })
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<ExecutedPayment> {
        let mut payments = self.payments.lock().await;
        let payment = payments.get_mut(payment_id).ok_or_else(|| {
            ShopError::PaymentProvider(format!("INVALID_RESOURCE_ID: {payment_id}"))
        })?;
        if payment.executed {
            return Err(ShopError::PaymentProvider(format!(
                "PAYMENT_ALREADY_DONE: {payment_id}"
            )));
        }
        if payer_id.trim().is_empty() {
            return Err(ShopError::PaymentProvider(
                "VALIDATION_ERROR: payer id is required".to_string(),
            ));
        }

        payment.executed = true;
        let state = if self.declined_payers.contains(payer_id) {
            STATE_FAILED
        } else {
            STATE_APPROVED
        };
        tracing::info!(
            %payment_id,
            %payer_id,
            amount = %payment.amount,
            currency = %payment.currency,
            state,
            "sandbox payment executed"
        );

        Ok(ExecutedPayment {
            payment_id: payment_id.to_string(),
            state: state.to_string(),
        })
    }
}
