use crate::domain::order::OrderId;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_RETURN_BASE_URL: &str = "http://localhost:5173";
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Checkout settings shared by the orchestrator and the payment adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Currency code sent to the payment provider.
    pub currency: String,
    /// Front-end origin the provider redirects back to.
    pub return_base_url: String,
    /// Upper bound for a single provider call.
    pub provider_timeout: Duration,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            return_base_url: DEFAULT_RETURN_BASE_URL.to_string(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl ShopConfig {
    pub fn success_url(&self, order_id: OrderId) -> String {
        format!("{}/payment/success?orderId={order_id}", self.base())
    }

    pub fn cancel_url(&self, order_id: OrderId) -> String {
        format!("{}/payment/cancel?orderId={order_id}", self.base())
    }

    fn base(&self) -> &str {
        self.return_base_url.trim_end_matches('/')
    }
}
