use super::abandon_order;
use crate::domain::order::{OrderId, OrderStatus};
use crate::domain::ports::{OrderStoreRef, PaymentGatewayRef};
use crate::error::{Result, ShopError};
use crate::locks::OrderLocks;
use serde::{Deserialize, Serialize};

/// Query parameters of the provider's success redirect. Untrusted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    pub payment_id: String,
    #[serde(alias = "PayerID")]
    pub payer_id: String,
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub success: bool,
    pub message: String,
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_state: Option<String>,
}

impl PaymentOutcome {
    fn new(success: bool, message: &str, order_id: OrderId) -> Self {
        Self {
            success,
            message: message.to_string(),
            order_id,
            payment_state: None,
        }
    }
}

/// Reconciles provider callbacks and user cancellations with order state.
///
/// Callbacks and cancels for the same order run one at a time, so a
/// duplicate callback only starts once the first has settled the order.
pub struct PaymentCallbackHandler {
    orders: OrderStoreRef,
    gateway: PaymentGatewayRef,
    in_flight: OrderLocks,
}

impl PaymentCallbackHandler {
    pub fn new(orders: OrderStoreRef, gateway: PaymentGatewayRef) -> Self {
        Self {
            orders,
            gateway,
            in_flight: OrderLocks::new(),
        }
    }

    /// Handles the provider's success callback.
    ///
    /// A replay against a confirmed order succeeds without side effects. A
    /// cancelled order is never resurrected. A payment id that does not match
    /// the order's stored reference is rejected and leaves the order alone.
    /// Any other failure past that check cancels the order.
    #[tracing::instrument(skip_all, fields(order_id = %callback.order_id, payment_id = %callback.payment_id))]
    pub async fn handle_success(&self, callback: PaymentCallback) -> Result<PaymentOutcome> {
        let order_id = callback.order_id;
        let _in_flight = self.in_flight.acquire(order_id).await;
        match self.orders.get_status(order_id).await? {
            OrderStatus::Confirmed => {
                tracing::info!("order already confirmed, ignoring replayed callback");
                return Ok(PaymentOutcome::new(true, "Order is already confirmed", order_id));
            }
            OrderStatus::Cancelled => {
                tracing::warn!("callback for cancelled order rejected");
                return Err(ShopError::InvalidTransition {
                    order_id,
                    from: OrderStatus::Cancelled,
                    to: OrderStatus::Confirmed,
                });
            }
            OrderStatus::PendingPayment => {}
        }

        match self.settle(&callback).await {
            Ok(outcome) => Ok(outcome),
            Err(err @ ShopError::PaymentReferenceMismatch(_)) => {
                tracing::warn!("payment reference mismatch, order left untouched");
                Err(err)
            }
            Err(err @ ShopError::CancelFailed { .. }) => Err(err),
            Err(err) => Err(abandon_order(self.orders.as_ref(), order_id, err).await),
        }
    }

    async fn settle(&self, callback: &PaymentCallback) -> Result<PaymentOutcome> {
        let order_id = callback.order_id;
        if !self
            .orders
            .validate_payment(order_id, &callback.payment_id)
            .await?
        {
            return Err(ShopError::PaymentReferenceMismatch(order_id));
        }

        let payment = self
            .gateway
            .execute_payment(&callback.payment_id, &callback.payer_id)
            .await?;

        if payment.is_approved() {
            self.orders.confirm(order_id).await?;
            tracing::info!("payment approved, order confirmed");
            return Ok(PaymentOutcome::new(
                true,
                "Your order has been paid via PayPal",
                order_id,
            ));
        }

        tracing::warn!(state = %payment.state, "payment not approved");
        let reason = format!("payment not approved, state: {}", payment.state);
        if let Err(source) = self.orders.cancel(order_id, &reason).await {
            tracing::error!(
                error = %source,
                "failed to cancel unapproved payment, left pending for reconciliation"
            );
            return Err(ShopError::CancelFailed {
                order_id,
                cause: reason,
                source: Box::new(source),
            });
        }
        Ok(PaymentOutcome {
            payment_state: Some(payment.state),
            ..PaymentOutcome::new(false, "Payment was not approved", order_id)
        })
    }

    /// Explicit user abandonment. Cancels a pending order without contacting
    /// the provider.
    #[tracing::instrument(skip(self))]
    pub async fn handle_cancel(&self, order_id: OrderId) -> Result<PaymentOutcome> {
        let _in_flight = self.in_flight.acquire(order_id).await;
        self.orders
            .cancel(order_id, "user cancelled the payment")
            .await?;
        tracing::info!("payment cancelled by user");
        Ok(PaymentOutcome::new(false, "Payment cancelled", order_id))
    }
}
