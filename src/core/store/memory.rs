use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::CollectionStore;
use crate::core::leads::types::Collection;

/// In-process store that counts writes, for engine tests.
#[derive(Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn with(collection: Collection) -> Self {
        Self {
            collection: Mutex::new(collection),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Collection {
        self.collection.lock().await.clone()
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn read(&self) -> Result<Collection> {
        Ok(self.collection.lock().await.clone())
    }

    async fn write(&self, collection: &Collection) -> Result<()> {
        *self.collection.lock().await = collection.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
