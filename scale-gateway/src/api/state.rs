//! Shared application state handed to every axum handler, the way the
//! teacher's `SharedState` wraps the pieces handlers need behind `Arc`s so
//! cloning per-request is cheap.

use std::sync::Arc;

use crate::codec::WeightUnit;
use crate::directory::Directory;
use crate::ingest::Ingest;
use crate::registry::Registry;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: Registry,
    pub directory: Directory,
    pub ingest: Arc<Ingest>,
    pub weight_unit: WeightUnit,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, weight_unit: WeightUnit) -> Self {
        Self {
            registry: Registry::new(store.clone()),
            directory: Directory::new(store.clone()),
            ingest: Arc::new(Ingest::new(store.clone())),
            store,
            weight_unit,
        }
    }
}
