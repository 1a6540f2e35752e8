use crate::domain::catalog::ProductId;
use crate::domain::order::{OrderId, OrderStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(ProductId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("Payment reference does not match order {0}")]
    PaymentReferenceMismatch(OrderId),
    #[error("Order {0} already carries a different payment reference")]
    PaymentReferenceConflict(OrderId),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Order {order_id} could not be cancelled after '{cause}': {source}")]
    CancelFailed {
        order_id: OrderId,
        cause: String,
        #[source]
        source: Box<ShopError>,
    },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShopError {
    /// Stable tag used in client-facing error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ProductNotFound(_) | Self::OrderNotFound(_) => "not_found",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::PaymentReferenceMismatch(_) => "payment_mismatch",
            Self::PaymentReferenceConflict(_) => "payment_conflict",
            Self::PaymentProvider(_) => "payment_provider",
            Self::Persistence(_) => "persistence",
            Self::CancelFailed { .. } => "cancel_failed",
            Self::Forbidden(_) => "forbidden",
            Self::Csv(_) | Self::Io(_) | Self::Json(_) => "internal",
        }
    }

    /// True for errors the caller caused (the 4xx class); everything else
    /// means the action did not take effect for reasons on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::ProductNotFound(_)
                | Self::OrderNotFound(_)
                | Self::InsufficientStock(_)
                | Self::InvalidTransition { .. }
                | Self::PaymentReferenceMismatch(_)
                | Self::PaymentReferenceConflict(_)
                | Self::PaymentProvider(_)
                | Self::Forbidden(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductNotFound(_) | Self::OrderNotFound(_))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ShopError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
