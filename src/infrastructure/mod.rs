//! Adapters behind the domain ports: stores and payment providers.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod sandbox_gateway;
pub mod timeout_gateway;

use crate::domain::ports::{
    CatalogReader, CatalogRef, CatalogWriter, CatalogWriterRef, OrderStore, OrderStoreRef,
};
use std::sync::Arc;

/// The storage handles the application layer is wired with.
///
/// Catalog and orders share one backing store, since confirmation has to
/// update both in the same atomic unit.
#[derive(Clone)]
pub struct Backend {
    pub catalog: CatalogRef,
    pub catalog_writer: CatalogWriterRef,
    pub orders: OrderStoreRef,
}

impl Backend {
    pub fn from_store<S>(store: S) -> Self
    where
        S: CatalogReader + CatalogWriter + OrderStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            catalog_writer: store.clone(),
            orders: store,
        }
    }
}
