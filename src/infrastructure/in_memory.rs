use crate::domain::catalog::{Product, ProductId};
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus, Transition};
use crate::domain::ports::{CatalogReader, CatalogWriter, OrderStore};
use crate::domain::user::UserId;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

type OrderEntry = Arc<Mutex<Order>>;

/// A thread-safe in-memory catalog and order store.
///
/// Each order sits behind its own mutex, so mutations of one order are
/// serialized while different orders proceed independently. The outer
/// `RwLock` only guards the id → entry map. Stock is touched solely by
/// `confirm`, under the order's mutex.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    products: Arc<Mutex<HashMap<ProductId, Product>>>,
    orders: Arc<RwLock<HashMap<OrderId, OrderEntry>>>,
    last_order_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(Mutex::new(catalog)),
            ..Self::default()
        }
    }

    async fn entry(&self, id: OrderId) -> Result<OrderEntry> {
        let orders = self.orders.read().await;
        orders.get(&id).cloned().ok_or(ShopError::OrderNotFound(id))
    }

    async fn snapshot(&self, filter: impl Fn(&Order) -> bool) -> Vec<Order> {
        let entries: Vec<OrderEntry> = self.orders.read().await.values().cloned().collect();
        let mut orders = Vec::with_capacity(entries.len());
        for entry in entries {
            let order = entry.lock().await;
            if filter(&order) {
                orders.push(order.clone());
            }
        }
        orders.sort_by_key(Order::id);
        orders
    }
}

#[async_trait]
impl CatalogReader for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let products = self.products.lock().await;
        Ok(products.get(&id).cloned())
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let products = self.products.lock().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

#[async_trait]
impl CatalogWriter for InMemoryStore {
    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut products = self.products.lock().await;
        products.insert(product.id, product);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_pending(&self, draft: NewOrder) -> Result<OrderId> {
        let id = OrderId(self.last_order_id.fetch_add(1, Ordering::SeqCst) + 1);
        let order = Order::open(id, draft, Utc::now());
        self.orders
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(order)));
        tracing::debug!(order_id = %id, "stored pending order");
        Ok(id)
    }

    async fn set_payment_reference(&self, id: OrderId, reference: &str) -> Result<()> {
        let entry = self.entry(id).await?;
        let mut order = entry.lock().await;
        order.attach_payment_reference(reference)?;
        Ok(())
    }

    async fn validate_payment(&self, id: OrderId, reference: &str) -> Result<bool> {
        let entry = self.entry(id).await?;
        let order = entry.lock().await;
        Ok(order.matches_payment(reference))
    }

    async fn confirm(&self, id: OrderId) -> Result<Transition> {
        let entry = self.entry(id).await?;
        let mut order = entry.lock().await;

        let mut next = order.clone();
        let transition = next.confirm()?;
        if !transition.is_applied() {
            return Ok(transition);
        }

        let quantities = next.quantities_by_product();
        let mut products = self.products.lock().await;
        // Resolve every product before touching any stock.
        if let Some(missing) = quantities.keys().find(|id| !products.contains_key(*id)) {
            return Err(ShopError::ProductNotFound(*missing));
        }
        for (product_id, quantity) in quantities {
            if let Some(product) = products.get_mut(&product_id) {
                product.stock -= quantity as i64;
            }
        }
        *order = next;
        Ok(transition)
    }

    async fn cancel(&self, id: OrderId, reason: &str) -> Result<Transition> {
        let entry = self.entry(id).await?;
        let mut order = entry.lock().await;
        order.cancel(reason)
    }

    async fn get_status(&self, id: OrderId) -> Result<OrderStatus> {
        let entry = self.entry(id).await?;
        let order = entry.lock().await;
        Ok(order.status())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        let entry = self.entry(id).await?;
        let order = entry.lock().await;
        Ok(order.clone())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.snapshot(|order| order.user_id() == user).await)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(self.snapshot(|_| true).await)
    }
}
