//! In-memory staging backend for tests.

use crate::error::{StagingError, StagingResult};
use crate::StagingStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStaging {
    entries: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently staged. For test assertions.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StagingStore for MemoryStaging {
    async fn store(&self, key: &str, data: Bytes) -> StagingResult<()> {
        self.entries.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn load(&self, key: &str) -> StagingResult<Bytes> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StagingError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StagingResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
