//! Storage for a tournament board: one JSON document of tournaments kept in an S3-compatible
//! bucket, readable by anyone and writable by admins holding a bucket credential.

/// Configuration for anonymous access to the public bucket.
pub mod config;
/// The admin credential and its colon-delimited string form.
pub mod credential;
/// Fire-and-forget user feedback (haptics on the host platform).
pub mod feedback;
/// Contains functions for logging.
pub mod log;
/// Tournament records and the helpers used to create them.
pub mod models;
/// Caller-side caching of the tournaments list.
pub mod query;
/// Admin login state backed by the platform's secure storage.
pub mod session;
/// Object storage backends.
pub mod storage;
/// The tournament store: read-only and admin access to the tournaments document.
pub mod store;

pub mod utils;

/// A thread-safe error type used outside the store itself.
pub type AppError = anyhow::Error;

pub use credential::Credential;
pub use models::{Tournament, TournamentStatus};
pub use store::{AdminStore, StoreHandle, TournamentStore, TOURNAMENTS_KEY};
pub use utils::error::StoreError;
