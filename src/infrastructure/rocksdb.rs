use crate::domain::catalog::{Product, ProductId};
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus, Transition};
use crate::domain::ports::{CatalogReader, CatalogWriter, OrderStore};
use crate::domain::user::UserId;
use crate::error::{Result, ShopError};
use crate::locks::OrderLocks;
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for catalog products.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for orders, lines embedded.
pub const CF_ORDERS: &str = "orders";

/// A persistent store implementation using RocksDB.
///
/// Products and orders live in separate Column Families under big-endian
/// id keys, so iteration follows id order. Mutations of one order are
/// serialized by a per-order lock; `confirm` additionally holds the stock
/// lock and commits the order and every touched product in one
/// `WriteBatch`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    order_locks: OrderLocks,
    stock_lock: Arc<Mutex<()>>,
    last_order_id: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures the column families exist and resumes the order id sequence
    /// after the highest stored order.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_products = ColumnFamilyDescriptor::new(CF_PRODUCTS, Options::default());
        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_products, cf_orders])?;
        let last_order_id = Self::highest_order_id(&db)?;
        tracing::info!(last_order_id, "opened RocksDB store");

        Ok(Self {
            db: Arc::new(db),
            order_locks: OrderLocks::new(),
            stock_lock: Arc::new(Mutex::new(())),
            last_order_id: Arc::new(AtomicU64::new(last_order_id)),
        })
    }

    fn highest_order_id(db: &DB) -> Result<u64> {
        let cf = db
            .cf_handle(CF_ORDERS)
            .ok_or_else(|| missing_cf(CF_ORDERS))?;
        match db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                decode_key(&key)
            }
            None => Ok(0),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| missing_cf(name))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: u64) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_all<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(decode(&value)?);
        }
        Ok(values)
    }

    fn write_order(&self, order: &Order) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        self.db
            .put_cf(cf, order.id().0.to_be_bytes(), encode(order)?)?;
        Ok(())
    }

    fn load_order(&self, id: OrderId) -> Result<Order> {
        self.read(CF_ORDERS, id.0)?
            .ok_or(ShopError::OrderNotFound(id))
    }
}

fn missing_cf(name: &str) -> ShopError {
    ShopError::Persistence(format!("column family '{name}' not found"))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| ShopError::Persistence(format!("Serialization error: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| ShopError::Persistence(format!("Deserialization error: {e}")))
}

fn decode_key(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| ShopError::Persistence(format!("malformed key of {} bytes", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl CatalogReader for RocksDBStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.read(CF_PRODUCTS, id.0)
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        self.read_all(CF_PRODUCTS)
    }
}

#[async_trait]
impl CatalogWriter for RocksDBStore {
    async fn upsert_product(&self, product: Product) -> Result<()> {
        let _stock = self.stock_lock.lock().await;
        let cf = self.cf(CF_PRODUCTS)?;
        self.db
            .put_cf(cf, product.id.0.to_be_bytes(), encode(&product)?)?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create_pending(&self, draft: NewOrder) -> Result<OrderId> {
        let id = OrderId(self.last_order_id.fetch_add(1, Ordering::SeqCst) + 1);
        let order = Order::open(id, draft, Utc::now());
        self.write_order(&order)?;
        tracing::debug!(order_id = %id, "stored pending order");
        Ok(id)
    }

    async fn set_payment_reference(&self, id: OrderId, reference: &str) -> Result<()> {
        let _guard = self.order_locks.acquire(id).await;
        let mut order = self.load_order(id)?;
        if order.attach_payment_reference(reference)?.is_applied() {
            self.write_order(&order)?;
        }
        Ok(())
    }

    async fn validate_payment(&self, id: OrderId, reference: &str) -> Result<bool> {
        Ok(self.load_order(id)?.matches_payment(reference))
    }

    async fn confirm(&self, id: OrderId) -> Result<Transition> {
        let _guard = self.order_locks.acquire(id).await;
        let mut order = self.load_order(id)?;
        let transition = order.confirm()?;
        if !transition.is_applied() {
            return Ok(transition);
        }

        let _stock = self.stock_lock.lock().await;
        let products_cf = self.cf(CF_PRODUCTS)?;
        let orders_cf = self.cf(CF_ORDERS)?;

        let mut batch = WriteBatch::default();
        for (product_id, quantity) in order.quantities_by_product() {
            let mut product: Product = self
                .read(CF_PRODUCTS, product_id.0)?
                .ok_or(ShopError::ProductNotFound(product_id))?;
            product.stock -= quantity as i64;
            batch.put_cf(products_cf, product_id.0.to_be_bytes(), encode(&product)?);
        }
        batch.put_cf(orders_cf, id.0.to_be_bytes(), encode(&order)?);
        self.db.write(batch)?;
        Ok(transition)
    }

    async fn cancel(&self, id: OrderId, reason: &str) -> Result<Transition> {
        let _guard = self.order_locks.acquire(id).await;
        let mut order = self.load_order(id)?;
        let transition = order.cancel(reason)?;
        if transition.is_applied() {
            self.write_order(&order)?;
        }
        Ok(transition)
    }

    async fn get_status(&self, id: OrderId) -> Result<OrderStatus> {
        Ok(self.load_order(id)?.status())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.load_order(id)
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.read_all(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|order| order.user_id() == user)
            .collect())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.read_all(CF_ORDERS)
    }
}
