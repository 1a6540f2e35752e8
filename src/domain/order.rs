use super::catalog::ProductId;
use super::money::Money;
use super::pricing;
use super::user::UserId;
use crate::error::{Result, ShopError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingPayment)
    }

    /// The transition table. `None` means the move is illegal.
    pub fn settle(self, settlement: Settlement) -> Option<Transition> {
        match (self, settlement) {
            (Self::PendingPayment, _) => Some(Transition::Applied),
            (Self::Confirmed, Settlement::Confirm) | (Self::Cancelled, Settlement::Cancel) => {
                Some(Transition::AlreadyApplied)
            }
            (Self::Confirmed, Settlement::Cancel) | (Self::Cancelled, Settlement::Confirm) => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only two ways out of `PENDING_PAYMENT`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Settlement {
    Confirm,
    Cancel,
}

impl Settlement {
    pub fn target(self) -> OrderStatus {
        match self {
            Self::Confirm => OrderStatus::Confirmed,
            Self::Cancel => OrderStatus::Cancelled,
        }
    }
}

/// Outcome of a legal state-machine move.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Transition {
    /// The status changed; side effects must be applied.
    Applied,
    /// The order was already in the target state; nothing to do.
    AlreadyApplied,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        *self == Self::Applied
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    #[serde(rename = "PAYPAL")]
    PayPal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "CASH_ON_DELIVERY",
            Self::PayPal => "PAYPAL",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" | "CASH_ON_DELIVERY" => Ok(Self::CashOnDelivery),
            "PAYPAL" => Ok(Self::PayPal),
            _ => Err(ShopError::InvalidInput(
                "unsupported payment method".to_string(),
            )),
        }
    }
}

/// One product/quantity/captured-price entry of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A validated, priced order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    user_id: UserId,
    lines: Vec<OrderLine>,
    total: Money,
    payment_method: PaymentMethod,
    shipping_address: String,
}

impl NewOrder {
    pub fn new(
        user_id: UserId,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
        shipping_address: impl Into<String>,
    ) -> Result<Self> {
        if lines.is_empty() {
            return Err(ShopError::InvalidInput("empty cart".to_string()));
        }
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(ShopError::InvalidInput(format!(
                "quantity must be positive for product {}",
                line.product_id
            )));
        }

        let total = pricing::total(&lines);
        Ok(Self {
            user_id,
            lines,
            total,
            payment_method,
            shipping_address: shipping_address.into(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }
}

/// The order aggregate. It exclusively owns its lines; the total is
/// captured once at creation and never re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    lines: Vec<OrderLine>,
    total: Money,
    shipping_address: String,
    payment_method: PaymentMethod,
    status: OrderStatus,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    cancellation_reason: Option<String>,
}

impl Order {
    /// Materializes a draft under its store-assigned id, in `PENDING_PAYMENT`.
    pub fn open(id: OrderId, draft: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            lines: draft.lines,
            total: draft.total,
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            status: OrderStatus::PendingPayment,
            payment_reference: None,
            created_at,
            cancellation_reason: None,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn confirm(&mut self) -> Result<Transition> {
        self.settle(Settlement::Confirm)
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<Transition> {
        let transition = self.settle(Settlement::Cancel)?;
        if transition.is_applied() {
            self.cancellation_reason = Some(reason.into());
        }
        Ok(transition)
    }

    fn settle(&mut self, settlement: Settlement) -> Result<Transition> {
        let transition =
            self.status
                .settle(settlement)
                .ok_or_else(|| ShopError::InvalidTransition {
                    order_id: self.id,
                    from: self.status,
                    to: settlement.target(),
                })?;
        self.status = settlement.target();
        Ok(transition)
    }

    /// Attaches the provider payment id. Re-attaching the same id is a no-op.
    pub fn attach_payment_reference(&mut self, reference: &str) -> Result<Transition> {
        match self.payment_reference.as_deref() {
            None => {
                self.payment_reference = Some(reference.to_string());
                Ok(Transition::Applied)
            }
            Some(existing) if existing == reference => Ok(Transition::AlreadyApplied),
            Some(_) => Err(ShopError::PaymentReferenceConflict(self.id)),
        }
    }

    pub fn matches_payment(&self, reference: &str) -> bool {
        self.payment_reference.as_deref() == Some(reference)
    }

    /// Total quantity per product, so a product listed on several lines is
    /// decremented once with the combined amount.
    pub fn quantities_by_product(&self) -> BTreeMap<ProductId, u64> {
        let mut quantities = BTreeMap::new();
        for line in &self.lines {
            *quantities.entry(line.product_id).or_insert(0) += u64::from(line.quantity);
        }
        quantities
    }
}
