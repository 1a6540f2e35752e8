use super::abandon_order;
use crate::config::ShopConfig;
use crate::domain::cart::{CartLine, CheckoutRequest};
use crate::domain::catalog::{Product, ProductId};
use crate::domain::order::{NewOrder, OrderId, OrderLine, PaymentMethod};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{CatalogRef, OrderStoreRef, PaymentGatewayRef};
use crate::domain::user::User;
use crate::error::{Result, ShopError};
use serde::Serialize;
use std::collections::BTreeMap;

/// What the client gets back from a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: OrderId,
    /// Present only for PayPal, where the client must visit the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
}

/// Validates carts against the catalog, prices them and dispatches to the
/// payment flow of the chosen method.
pub struct CheckoutService {
    catalog: CatalogRef,
    orders: OrderStoreRef,
    gateway: PaymentGatewayRef,
    config: ShopConfig,
}

impl CheckoutService {
    pub fn new(
        catalog: CatalogRef,
        orders: OrderStoreRef,
        gateway: PaymentGatewayRef,
        config: ShopConfig,
    ) -> Self {
        Self {
            catalog,
            orders,
            gateway,
            config,
        }
    }

    /// Runs a checkout for `user`.
    ///
    /// Nothing is persisted unless the cart passes every check: non-empty,
    /// positive quantities, known products, enough stock and a supported
    /// payment method. Stock is only checked here; it is decremented when
    /// the order is confirmed.
    #[tracing::instrument(skip_all, fields(user_id = %user.id, method = %request.payment_method))]
    pub async fn checkout(&self, request: CheckoutRequest, user: &User) -> Result<CheckoutResult> {
        let lines = self.price_cart(&request.cart_items).await?;
        let method: PaymentMethod = request.payment_method.parse()?;
        let draft = NewOrder::new(user.id, lines, method, request.shipping_address)?;

        match method {
            PaymentMethod::CashOnDelivery => self.checkout_cash(draft).await,
            PaymentMethod::PayPal => self.checkout_paypal(draft).await,
        }
    }

    async fn price_cart(&self, cart: &[CartLine]) -> Result<Vec<OrderLine>> {
        if cart.is_empty() {
            return Err(ShopError::InvalidInput("empty cart".to_string()));
        }
        if let Some(line) = cart.iter().find(|line| line.quantity == 0) {
            return Err(ShopError::InvalidInput(format!(
                "quantity must be positive for product {}",
                line.product_id
            )));
        }

        let mut products: BTreeMap<ProductId, Product> = BTreeMap::new();
        for line in cart {
            if products.contains_key(&line.product_id) {
                continue;
            }
            let product = self
                .catalog
                .get_product(line.product_id)
                .await?
                .filter(Product::is_available)
                .ok_or(ShopError::ProductNotFound(line.product_id))?;
            products.insert(product.id, product);
        }

        let mut requested: BTreeMap<ProductId, u64> = BTreeMap::new();
        for line in cart {
            *requested.entry(line.product_id).or_insert(0) += u64::from(line.quantity);
        }
        for line in cart {
            let product = &products[&line.product_id];
            if !product.has_stock_for(requested[&line.product_id]) {
                return Err(ShopError::InsufficientStock(line.product_id));
            }
        }

        Ok(cart
            .iter()
            .map(|line| {
                let product = &products[&line.product_id];
                if let Some(asserted) = line.price
                    && asserted != product.price.value()
                {
                    tracing::debug!(
                        product_id = %product.id,
                        %asserted,
                        catalog = %product.price,
                        "ignoring client-asserted price"
                    );
                }
                OrderLine {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    category: product.category.clone(),
                    quantity: line.quantity,
                    unit_price: product.price,
                }
            })
            .collect())
    }

    async fn checkout_cash(&self, draft: NewOrder) -> Result<CheckoutResult> {
        let order_id = self.orders.create_pending(draft).await?;
        if let Err(err) = self.orders.confirm(order_id).await {
            return Err(abandon_order(self.orders.as_ref(), order_id, err).await);
        }
        tracing::info!(%order_id, "cash on delivery order confirmed");

        Ok(CheckoutResult {
            order_id,
            approval_url: None,
        })
    }

    async fn checkout_paypal(&self, draft: NewOrder) -> Result<CheckoutResult> {
        let amount = draft.total().value();
        let order_id = self.orders.create_pending(draft).await?;

        let request = PaymentRequest {
            amount,
            currency: self.config.currency.clone(),
            description: format!("Order {order_id}"),
            cancel_url: self.config.cancel_url(order_id),
            success_url: self.config.success_url(order_id),
        };
        let payment = match self.gateway.create_payment(request).await {
            Ok(payment) => payment,
            Err(err) => return Err(abandon_order(self.orders.as_ref(), order_id, err).await),
        };
        if let Err(err) = self
            .orders
            .set_payment_reference(order_id, &payment.payment_id)
            .await
        {
            return Err(abandon_order(self.orders.as_ref(), order_id, err).await);
        }
        tracing::info!(%order_id, payment_id = %payment.payment_id, "awaiting PayPal approval");

        Ok(CheckoutResult {
            order_id,
            approval_url: Some(payment.approval_url),
        })
    }
}
