//! Scale identity store.
//!
//! A thin layer over [`Store`] -- all the interesting concurrency and
//! idempotency guarantees live in the store's unique index on MAC, not here.

use std::sync::Arc;

use crate::domain::scale::ScaleContact;
use crate::domain::Scale;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn Store>,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create or refresh a scale's registry row. Idempotent.
    pub async fn upsert(&self, contact: ScaleContact) -> Result<Scale, StoreError> {
        self.store.upsert_scale(contact).await
    }

    pub async fn get(&self, mac: [u8; 6]) -> Result<Option<Scale>, StoreError> {
        self.store.get_scale(mac).await
    }

    pub async fn list(&self) -> Result<Vec<Scale>, StoreError> {
        self.store.list_scales().await
    }
}
