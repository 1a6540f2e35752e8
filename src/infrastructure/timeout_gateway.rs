use crate::domain::payment::{CreatedPayment, ExecutedPayment, PaymentRequest};
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Bounds every provider call by a transport timeout.
///
/// An elapsed call surfaces as `ShopError::PaymentProvider`, which callers
/// already treat as "not approved".
pub struct TimeoutGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G: PaymentGateway> TimeoutGateway<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(&self, call: &str, future: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(call, timeout = ?self.timeout, "payment provider call timed out");
                Err(ShopError::PaymentProvider(format!(
                    "{call} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for TimeoutGateway<G> {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment> {
        self.bounded("create_payment", self.inner.create_payment(request))
            .await
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<ExecutedPayment> {
        self.bounded(
            "execute_payment",
            self.inner.execute_payment(payment_id, payer_id),
        )
        .await
    }
}
