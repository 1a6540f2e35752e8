use super::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A catalog entry as seen by checkout.
///
/// Stock is signed: confirmation decrements without a floor check, so two
/// confirmed orders racing for the last units can push it below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub stock: i64,
    /// Soft-deleted products stay readable for old orders but cannot be bought.
    #[serde(default)]
    pub deleted: bool,
}

impl Product {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        stock: i64,
    ) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            category: category.into(),
            price,
            stock,
            deleted: false,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.deleted
    }

    pub fn has_stock_for(&self, quantity: u64) -> bool {
        i128::from(self.stock) >= i128::from(quantity)
    }
}
