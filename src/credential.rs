use std::str::FromStr;

use crate::utils::error::StoreError;

/// Admin access to the tournaments bucket.
///
/// Travels as a single `accessKeyId:secretAccessKey:endpoint:region:bucket` string, which is what
/// the admin types in and what gets kept in secure storage between sessions. Fields are split
/// positionally, so none of them may contain a colon. That includes the endpoint, which therefore
/// cannot carry a scheme or a port.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
}

impl FromStr for Credential {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        match fields.as_slice() {
            [access_key_id, secret_access_key, endpoint, region, bucket] => Ok(Self {
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
                endpoint: endpoint.to_string(),
                region: region.to_string(),
                bucket: bucket.to_string(),
            }),
            _ => Err(StoreError::MalformedCredential {
                fields: fields.len(),
            }),
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.access_key_id, self.secret_access_key, self.endpoint, self.region, self.bucket
        )
    }
}

// The secret must never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}
