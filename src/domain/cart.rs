use super::catalog::ProductId;
use rust_decimal::Decimal;
use serde::Deserialize;

/// A client-supplied cart entry. The asserted `price` is informational
/// only; checkout always re-derives it from the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl CartLine {
    pub fn new(product_id: u64, quantity: u32) -> Self {
        Self {
            product_id: ProductId(product_id),
            quantity,
            price: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub shipping_address: String,
    pub payment_method: String,
}
