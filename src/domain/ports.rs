use super::catalog::{Product, ProductId};
use super::order::{NewOrder, Order, OrderId, OrderStatus, Transition};
use super::payment::{CreatedPayment, ExecutedPayment, PaymentRequest};
use super::user::UserId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only product lookup.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn all_products(&self) -> Result<Vec<Product>>;
}

/// Catalog seeding, used when loading fixtures. Checkout never writes here.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn upsert_product(&self, product: Product) -> Result<()>;
}

/// Owns order persistence and the order state machine.
///
/// Implementations must make every mutation of one order atomic with
/// respect to the others for that same order: the status check and the
/// write happen as one unit, and `confirm` applies the status flip and all
/// stock decrements together or not at all.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_pending(&self, draft: NewOrder) -> Result<OrderId>;
    async fn set_payment_reference(&self, id: OrderId, reference: &str) -> Result<()>;
    async fn validate_payment(&self, id: OrderId, reference: &str) -> Result<bool>;
    async fn confirm(&self, id: OrderId) -> Result<Transition>;
    async fn cancel(&self, id: OrderId, reason: &str) -> Result<Transition>;
    async fn get_status(&self, id: OrderId) -> Result<OrderStatus>;
    async fn get_by_id(&self, id: OrderId) -> Result<Order>;
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
}

/// The external payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment>;
    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<ExecutedPayment>;
}

#[async_trait]
impl<G: PaymentGateway + ?Sized> PaymentGateway for Arc<G> {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment> {
        (**self).create_payment(request).await
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<ExecutedPayment> {
        (**self).execute_payment(payment_id, payer_id).await
    }
}

pub type CatalogRef = Arc<dyn CatalogReader>;
pub type CatalogWriterRef = Arc<dyn CatalogWriter>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
