use aws_sdk_s3::{
    config::{
        http::HttpResponse, retry::RetryConfig, BehaviorVersion, Credentials, Region,
        RequestChecksumCalculation,
    },
    error::{DisplayErrorContext, SdkError},
    operation::get_object::GetObjectError,
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client, Config,
};
use tracing::debug;
use url::Url;

use super::{Connect, ObjectAcl, ObjectStorage};
use crate::{config::PublicBucketConfig, credential::Credential, utils::error::StoreError};

/// Name the SDK reports for credentials built from an admin token.
const CREDENTIALS_PROVIDER: &str = "tourney-board";

/// Normalises a storage endpoint into the URL the SDK sends requests to.
///
/// A bare host such as `storage.example.net` means HTTPS.
pub fn endpoint_url(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidEndpoint(raw.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url =
        Url::parse(&with_scheme).map_err(|_| StoreError::InvalidEndpoint(raw.to_string()))?;
    if url.host_str().is_none() {
        return Err(StoreError::InvalidEndpoint(raw.to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl From<ObjectAcl> for ObjectCannedAcl {
    fn from(acl: ObjectAcl) -> Self {
        match acl {
            ObjectAcl::Private => ObjectCannedAcl::Private,
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        }
    }
}

/// Turns an SDK failure into a store error. Anything the service answered is a status error,
/// everything else (no connection, timeouts, unreadable responses) is a transport error.
fn request_failed<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + 'static,
{
    match err {
        SdkError::ServiceError(service) => StoreError::Status {
            operation,
            status: service.raw().status().as_u16(),
        },
        other => StoreError::Transport(DisplayErrorContext(&other).to_string()),
    }
}

/// An S3-compatible object storage client.
///
/// Buckets are addressed path-style. Requests are signed with SigV4 when the client was built
/// from a credential and sent unsigned otherwise, which only works against publicly readable
/// objects. The SDK's own retries are off: the store reports the first failure.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    endpoint: String,
    region: String,
    signed: bool,
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("signed", &self.signed)
            .finish()
    }
}

impl S3Client {
    /// A client for unauthenticated reads.
    pub fn anonymous(endpoint: &str, region: &str) -> Result<Self, StoreError> {
        Self::build(endpoint, region, None)
    }

    /// A client that signs every request with the credential's keys.
    pub fn authorized(credential: &Credential) -> Result<Self, StoreError> {
        let credentials = Credentials::new(
            &credential.access_key_id,
            &credential.secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );
        Self::build(&credential.endpoint, &credential.region, Some(credentials))
    }

    fn build(
        endpoint: &str,
        region: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, StoreError> {
        let endpoint = endpoint_url(endpoint)?;
        let signed = credentials.is_some();

        // Many S3-compatible stores reject the SDK's default upload checksums.
        let mut config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(&endpoint)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired);
        if let Some(credentials) = credentials {
            config = config.credentials_provider(credentials);
        }

        Ok(Self {
            client: Client::from_conf(config.build()),
            endpoint,
            region: region.to_string(),
            signed,
        })
    }
}

impl ObjectStorage for S3Client {
    async fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| request_failed("head bucket", e))?;

        debug!(bucket, "head bucket");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            // Only a missing key is "no document". A missing bucket stays an error.
            Err(e) if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                debug!(bucket, key, "no such key");
                return Ok(None);
            }
            Err(e) => return Err(request_failed("get object", e)),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?
            .into_bytes()
            .to_vec();

        debug!(bucket, key, bytes = body.len(), "get object");
        Ok(Some(body))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), StoreError> {
        let bytes = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(acl.into())
            .send()
            .await
            .map_err(|e| request_failed("put object", e))?;

        debug!(bucket, key, bytes, "put object");
        Ok(())
    }
}

/// Builds `S3Client`s for either access mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Connector;

impl Connect for S3Connector {
    type Storage = S3Client;

    fn anonymous(&self, config: &PublicBucketConfig) -> Result<S3Client, StoreError> {
        S3Client::anonymous(&config.endpoint, &config.region)
    }

    fn authorized(&self, credential: &Credential) -> Result<S3Client, StoreError> {
        S3Client::authorized(credential)
    }
}
