use crate::domain::catalog::ProductId;
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderId, OrderStatus, PaymentMethod};
use crate::domain::ports::OrderStoreRef;
use crate::domain::user::{User, UserId};
use crate::error::{Result, ShopError};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub is_confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
}

/// The order as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemView>,
    pub total_price: Money,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            user_id: order.user_id(),
            items: order
                .lines()
                .iter()
                .map(|line| OrderItemView {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            total_price: order.total(),
            shipping_address: order.shipping_address().to_string(),
            payment_method: order.payment_method(),
            order_date: order.created_at(),
            status: order.status(),
        }
    }
}

/// Read-only projections for status polling and order listings.
pub struct OrderQueries {
    orders: OrderStoreRef,
}

impl OrderQueries {
    pub fn new(orders: OrderStoreRef) -> Self {
        Self { orders }
    }

    pub async fn status(&self, order_id: OrderId) -> Result<OrderStatusView> {
        let status = self.orders.get_status(order_id).await?;
        Ok(OrderStatusView {
            order_id,
            status,
            is_confirmed: status == OrderStatus::Confirmed,
        })
    }

    pub async fn orders_for(&self, user: &User) -> Result<Vec<OrderView>> {
        let orders = self.orders.orders_for_user(user.id).await?;
        Ok(orders.iter().map(OrderView::from).collect())
    }

    pub async fn all_orders(&self, user: &User) -> Result<Vec<OrderView>> {
        if !user.is_admin() {
            return Err(ShopError::Forbidden(
                "listing all orders requires the admin role".to_string(),
            ));
        }
        let orders = self.orders.all_orders().await?;
        Ok(orders.iter().map(OrderView::from).collect())
    }

    pub async fn order(&self, user: &User, order_id: OrderId) -> Result<OrderView> {
        let order = self.orders.get_by_id(order_id).await?;
        if order.user_id() != user.id && !user.is_admin() {
            return Err(ShopError::Forbidden(format!(
                "order {order_id} belongs to another user"
            )));
        }
        Ok(OrderView::from(&order))
    }
}
