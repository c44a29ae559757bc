use crate::{
    Config,
    books::BookLifecycle,
    identity::{IdentityProvider, StoreIdentityProvider},
    store::DocumentStore,
    utils::{KeyedRateLimiter, build_rate_limiter},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub books: BookLifecycle,
    pub config: Config,
    pub rate_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// Wire the core services over a document store, with credentials kept in the same store.
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            identity: Arc::new(StoreIdentityProvider::new(store.clone())),
            books: BookLifecycle::new(store.clone()),
            store,
            config,
            rate_limiter: build_rate_limiter(),
        }
    }
}
