//! In-memory entity repositories.
//!
//! A thin keyed store shared across tasks. Ordering of `list` is by key so
//! results are stable between calls.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A concurrent id-keyed store for one entity type.
#[derive(Clone)]
pub struct Repository<T: Clone + Send + Sync> {
    items: Arc<RwLock<BTreeMap<String, T>>>,
}

impl<T: Clone + Send + Sync> Default for Repository<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync> Repository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: impl Into<String>, item: T) {
        self.items.write().await.insert(id.into(), item);
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<T> {
        self.items.write().await.remove(id)
    }

    pub async fn list(&self) -> Vec<T> {
        self.items.read().await.values().cloned().collect()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.items.read().await.contains_key(id)
    }

    /// Apply `f` to the stored item, if present, and persist the result.
    pub async fn modify(&self, id: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut items = self.items.write().await;
        let item = items.get_mut(id)?;
        f(item);
        Some(item.clone())
    }
}
