use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{Connect, ObjectAcl, ObjectStorage};
use crate::{config::PublicBucketConfig, credential::Credential, utils::error::StoreError};

/// An object as kept by `MemoryStorage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub acl: ObjectAcl,
}

/// How many times each operation reached the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub head_bucket: usize,
    pub get_object: usize,
    pub put_object: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.head_bucket + self.get_object + self.put_object
    }
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, HashMap<String, StoredObject>>,
    offline: bool,
    calls: CallCounts,
}

/// Object storage held in memory and shared between clones.
///
/// Every operation yields to the runtime before touching the data, like a network hop would,
/// so concurrent read-modify-write cycles interleave the same way they do against a real bucket.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage with one empty bucket already created.
    pub fn with_bucket(bucket: &str) -> Self {
        let storage = Self::new();
        storage.create_bucket(bucket);
        storage
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.state().buckets.entry(bucket.to_string()).or_default();
    }

    /// Writes an object directly, without counting it as a call.
    pub fn insert_object(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.state().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: "application/json".to_string(),
                acl: ObjectAcl::Private,
            },
        );
    }

    /// Reads an object directly, without counting it as a call.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    /// While offline, every operation fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    fn no_such_bucket(operation: &'static str) -> StoreError {
        StoreError::Status {
            operation,
            status: 404,
        }
    }

    fn unreachable() -> StoreError {
        StoreError::Transport("network unreachable".to_string())
    }
}

impl ObjectStorage for MemoryStorage {
    async fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.calls.head_bucket += 1;

        if state.offline {
            return Err(Self::unreachable());
        }
        if state.buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(Self::no_such_bucket("head bucket"))
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.calls.get_object += 1;

        if state.offline {
            return Err(Self::unreachable());
        }
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket("get object"))?;
        Ok(objects.get(key).map(|object| object.body.clone()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.calls.put_object += 1;

        if state.offline {
            return Err(Self::unreachable());
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket("put object"))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                acl,
            },
        );
        Ok(())
    }
}

impl Connect for MemoryStorage {
    type Storage = MemoryStorage;

    fn anonymous(&self, _config: &PublicBucketConfig) -> Result<MemoryStorage, StoreError> {
        Ok(self.clone())
    }

    fn authorized(&self, _credential: &Credential) -> Result<MemoryStorage, StoreError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_objects_read_as_none() {
        let storage = MemoryStorage::with_bucket("cups");
        assert_eq!(storage.get_object("cups", "nope.json").await.unwrap(), None);
        assert_eq!(storage.calls().get_object, 1);
    }

    #[tokio::test]
    async fn missing_buckets_fail() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.head_bucket("cups").await,
            Err(StoreError::Status { status: 404, .. })
        ));
        assert!(storage
            .put_object("cups", "k", vec![], "text/plain", ObjectAcl::Private)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn offline_storage_fails_every_call() {
        let storage = MemoryStorage::with_bucket("cups");
        storage.set_offline(true);
        assert!(matches!(
            storage.get_object("cups", "k").await,
            Err(StoreError::Transport(_))
        ));
        assert_eq!(storage.calls().total(), 1);
    }

    #[tokio::test]
    async fn puts_keep_metadata() {
        let storage = MemoryStorage::with_bucket("cups");
        storage
            .put_object(
                "cups",
                "k",
                b"[]".to_vec(),
                "application/json",
                ObjectAcl::PublicRead,
            )
            .await
            .unwrap();
        let object = storage.object("cups", "k").unwrap();
        assert_eq!(object.body, b"[]");
        assert_eq!(object.acl, ObjectAcl::PublicRead);
        assert_eq!(object.content_type, "application/json");
    }
}
