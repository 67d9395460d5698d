//! Runtime configuration for anonymous, read-only access to the tournaments bucket.

use std::env;

/// Where unauthenticated visitors read tournaments from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicBucketConfig {
    /// Storage endpoint, with or without a scheme.
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
}

impl PublicBucketConfig {
    pub const DEFAULT_REGION: &'static str = "eu-central-1";

    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            bucket: bucket.into(),
        }
    }

    /// Reads `S3_ENDPOINT`, `S3_REGION` and `PUBLIC_BUCKET`.
    ///
    /// Missing values are not an error here: an empty endpoint or bucket only fails once the
    /// store actually talks to the backend.
    pub fn from_env() -> Self {
        // Load the .env file only in the development environment (bypassed with the --release flag)
        #[cfg(debug_assertions)]
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let endpoint = lookup("S3_ENDPOINT").unwrap_or_default();
        let region = lookup("S3_REGION")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_REGION.to_string());
        let bucket = lookup("PUBLIC_BUCKET").unwrap_or_default();

        Self {
            endpoint,
            region,
            bucket,
        }
    }
}
