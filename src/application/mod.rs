//! Application layer containing the checkout and payment orchestration.
//!
//! `CheckoutService` turns a cart into an order, `PaymentCallbackHandler`
//! reconciles provider callbacks against order state, and `OrderQueries`
//! serves the read-only projections.

pub mod checkout;
pub mod orders;
pub mod payment_callback;

use crate::domain::order::OrderId;
use crate::domain::ports::OrderStore;
use crate::error::ShopError;

/// Best-effort cancel after `cause` interrupted an order's flow.
///
/// Returns `cause` when the order was cancelled (or already was). If the
/// cancel itself fails the order stays `PENDING_PAYMENT` and needs out of
/// band reconciliation; that is surfaced as `CancelFailed`.
pub(crate) async fn abandon_order(
    orders: &dyn OrderStore,
    order_id: OrderId,
    cause: ShopError,
) -> ShopError {
    let reason = cause.to_string();
    match orders.cancel(order_id, &reason).await {
        Ok(_) => {
            tracing::warn!(%order_id, %reason, "order cancelled after failure");
            cause
        }
        Err(cancel_error) => {
            tracing::error!(
                %order_id,
                %reason,
                error = %cancel_error,
                "failed to cancel order, left pending for reconciliation"
            );
            ShopError::CancelFailed {
                order_id,
                cause: reason,
                source: Box::new(cancel_error),
            }
        }
    }
}
