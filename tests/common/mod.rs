#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use webshop::application::checkout::CheckoutService;
use webshop::application::payment_callback::PaymentCallbackHandler;
use webshop::config::ShopConfig;
use webshop::domain::catalog::{Product, ProductId};
use webshop::domain::money::Money;
use webshop::domain::order::{NewOrder, Order, OrderId, OrderStatus, Transition};
use webshop::domain::payment::{CreatedPayment, ExecutedPayment, PaymentRequest};
use webshop::domain::ports::{CatalogReader, OrderStore, PaymentGateway};
use webshop::domain::user::UserId;
use webshop::error::{Result, ShopError};
use webshop::infrastructure::in_memory::InMemoryStore;

/// How the fake provider answers `execute_payment`.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Approve,
    Decline(&'static str),
    Fail,
    Stall,
    /// First execution approves after the delay; later ones are rejected
    /// as already done, like the real provider.
    ApproveOnceAfter(Duration),
}

/// Scriptable provider double that records what it was asked.
pub struct FakeGateway {
    pub behavior: Mutex<Behavior>,
    pub fail_create: AtomicBool,
    pub created: Mutex<Vec<PaymentRequest>>,
    pub executions: AtomicUsize,
}

impl FakeGateway {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            fail_create: AtomicBool::new(false),
            created: Mutex::new(Vec::new()),
            executions: AtomicUsize::new(0),
        }
    }

    pub async fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().await = behavior;
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ShopError::PaymentProvider("503 Service Unavailable".to_string()));
        }
        let mut created = self.created.lock().await;
        created.push(request);
        let n = created.len();
        Ok(CreatedPayment {
            payment_id: format!("PAY-{n}"),
            approval_url: format!("https://provider.test/approve/PAY-{n}"),
        })
    }

    async fn execute_payment(&self, payment_id: &str, _payer_id: &str) -> Result<ExecutedPayment> {
        let previous = self.executions.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().await.clone();
        let state = match behavior {
            Behavior::Approve => "approved",
            Behavior::Decline(state) => state,
            Behavior::Fail => {
                return Err(ShopError::PaymentProvider("connection reset".to_string()));
            }
            Behavior::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "approved"
            }
            Behavior::ApproveOnceAfter(delay) => {
                if previous > 0 {
                    return Err(ShopError::PaymentProvider(format!(
                        "PAYMENT_ALREADY_DONE: {payment_id}"
                    )));
                }
                tokio::time::sleep(delay).await;
                "approved"
            }
        };
        Ok(ExecutedPayment {
            payment_id: payment_id.to_string(),
            state: state.to_string(),
        })
    }
}

/// In-memory store with switchable write failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_confirm: AtomicBool,
    pub fail_cancel: AtomicBool,
    pub fail_set_reference: AtomicBool,
    pub cancel_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(ShopError::Persistence(format!("{what} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogReader for FlakyStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        self.inner.all_products().await
    }
}

#[async_trait]
impl OrderStore for FlakyStore {
    async fn create_pending(&self, draft: NewOrder) -> Result<OrderId> {
        self.inner.create_pending(draft).await
    }

    async fn set_payment_reference(&self, id: OrderId, reference: &str) -> Result<()> {
        Self::check(&self.fail_set_reference, "set_payment_reference")?;
        self.inner.set_payment_reference(id, reference).await
    }

    async fn validate_payment(&self, id: OrderId, reference: &str) -> Result<bool> {
        self.inner.validate_payment(id, reference).await
    }

    async fn confirm(&self, id: OrderId) -> Result<Transition> {
        Self::check(&self.fail_confirm, "confirm")?;
        self.inner.confirm(id).await
    }

    async fn cancel(&self, id: OrderId, reason: &str) -> Result<Transition> {
        self.cancel_attempts.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_cancel, "cancel")?;
        self.inner.cancel(id, reason).await
    }

    async fn get_status(&self, id: OrderId) -> Result<OrderStatus> {
        self.inner.get_status(id).await
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.inner.get_by_id(id).await
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        self.inner.orders_for_user(user).await
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.inner.all_orders().await
    }
}

/// Desk 10.00 x5, Chair 25.50 x1, Lamp 3.00 (deleted).
pub fn catalog() -> InMemoryStore {
    let mut lamp = Product::new(3, "Lamp", "Home", Money::new(dec!(3.00)).unwrap(), 10);
    lamp.deleted = true;
    InMemoryStore::with_products([
        Product::new(1, "Desk", "Furniture", Money::new(dec!(10.00)).unwrap(), 5),
        Product::new(2, "Chair", "Furniture", Money::new(dec!(25.50)).unwrap(), 1),
        lamp,
    ])
}

/// Services wired against a `FlakyStore` and a `FakeGateway`.
pub struct Shop {
    pub store: Arc<FlakyStore>,
    pub gateway: Arc<FakeGateway>,
    pub checkout: CheckoutService,
    pub callbacks: PaymentCallbackHandler,
}

impl Shop {
    pub fn new(behavior: Behavior) -> Self {
        let store = Arc::new(FlakyStore::new(catalog()));
        let gateway = Arc::new(FakeGateway::new(behavior));
        Self {
            checkout: CheckoutService::new(
                store.clone(),
                store.clone(),
                gateway.clone(),
                ShopConfig::default(),
            ),
            callbacks: PaymentCallbackHandler::new(store.clone(), gateway.clone()),
            store,
            gateway,
        }
    }

    pub async fn stock(&self, id: u64) -> i64 {
        self.store
            .get_product(ProductId(id))
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    pub async fn status(&self, id: OrderId) -> OrderStatus {
        self.store.get_status(id).await.unwrap()
    }
}
