use crate::{config::PublicBucketConfig, credential::Credential, utils::error::StoreError};

/// An in-process object store, used for tests and offline runs.
pub mod memory;
/// An S3-compatible object store reached through the AWS SDK.
pub mod s3;

pub use memory::MemoryStorage;
pub use s3::{S3Client, S3Connector};

/// Who may read an object once it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

/// The slice of an object storage API that the tournament store relies on.
///
/// A missing object on read is part of the contract (`Ok(None)`), not an error. A missing
/// bucket is an error, like every other failure, and nothing is retried here.
#[allow(async_fn_in_trait)]
pub trait ObjectStorage {
    /// Cheap existence and permission check on a bucket.
    async fn head_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Fetches an object's body, or `None` if there is no object under `key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the object under `key` with `body` in a single request.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), StoreError>;
}

/// Builds a storage client for one of the two access modes.
///
/// Stores are cheap to build and get a fresh client each time.
pub trait Connect {
    type Storage: ObjectStorage;

    /// A client for read-only, unauthenticated access.
    fn anonymous(&self, config: &PublicBucketConfig) -> Result<Self::Storage, StoreError>;

    /// A client that signs its requests with `credential`.
    fn authorized(&self, credential: &Credential) -> Result<Self::Storage, StoreError>;
}
