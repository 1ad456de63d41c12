use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ObjectStore, PutObject, StorageTarget};
use crate::error::EtlError;

/// Keeps objects in memory, keyed by `(bucket, key)`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), PutObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &StorageTarget) -> Option<PutObject> {
        self.lock()
            .get(&(target.bucket.clone(), target.key.clone()))
            .cloned()
    }

    /// Stored targets, sorted by bucket then key.
    pub fn targets(&self) -> Vec<StorageTarget> {
        self.lock()
            .keys()
            .map(|(bucket, key)| StorageTarget::new(bucket, key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), PutObject>> {
        // A poisoned map is still usable; writes are single inserts.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, object: PutObject) -> Result<(), EtlError> {
        let id = (object.target.bucket.clone(), object.target.key.clone());
        self.lock().insert(id, object);
        Ok(())
    }
}
