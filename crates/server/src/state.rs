//! Session-scoped dataset store

use std::collections::HashMap;
use std::sync::Arc;

use tally_recon::{Cleaned, Customers, Dataset, Orders};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

/// Application state shared across handlers
#[derive(Clone, Default)]
pub struct AppState {
    pub sessions: SessionStore,
}

/// The cleaned datasets uploaded to one session. Either side may be missing
/// until its upload succeeds; a later upload replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub customers: Option<Arc<Cleaned<Customers>>>,
    pub orders: Option<Arc<Cleaned<Orders>>>,
}

impl Session {
    pub fn customers(&self) -> Result<Arc<Cleaned<Customers>>, ApiError> {
        self.customers.clone().ok_or(ApiError::MissingDataset(Dataset::Customers))
    }

    pub fn orders(&self) -> Result<Arc<Cleaned<Orders>>, ApiError> {
        self.orders.clone().ok_or(ApiError::MissingDataset(Dataset::Orders))
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.insert(id, Session::default());
        id
    }

    /// Snapshot of a session. Datasets are shared, not copied.
    pub async fn get(&self, id: Uuid) -> Result<Session, ApiError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }

    pub async fn set_customers(&self, id: Uuid, customers: Cleaned<Customers>) -> Result<(), ApiError> {
        self.update(id, |session| session.customers = Some(Arc::new(customers))).await
    }

    pub async fn set_orders(&self, id: Uuid, orders: Cleaned<Orders>) -> Result<(), ApiError> {
        self.update(id, |session| session.orders = Some(Arc::new(orders))).await
    }

    async fn update(&self, id: Uuid, apply: impl FnOnce(&mut Session)) -> Result<(), ApiError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
        apply(session);
        Ok(())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), ApiError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::SessionNotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
