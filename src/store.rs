use tracing::{debug, error, info, warn};

use crate::{
    config::PublicBucketConfig,
    credential::Credential,
    models::Tournament,
    storage::{Connect, ObjectAcl, ObjectStorage},
    utils::error::StoreError,
};

/// The key under which the whole tournaments document lives.
pub const TOURNAMENTS_KEY: &str = "tournaments.json";

const CONTENT_TYPE: &str = "application/json";

/// Read-only access to the tournaments document.
///
/// This is what unauthenticated visitors get. There is no way to write through it.
#[derive(Debug, Clone)]
pub struct TournamentStore<S> {
    storage: S,
    bucket: String,
}

impl<S: ObjectStorage> TournamentStore<S> {
    pub fn new(storage: S, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Checks that the bucket exists and is reachable with this store's access.
    ///
    /// Any failure (bad keys, unknown bucket, network) is reported as `false`.
    pub async fn validate(&self) -> bool {
        match self.storage.head_bucket(&self.bucket).await {
            Ok(()) => true,
            Err(e) => {
                warn!(bucket = %self.bucket, "Credential validation failed: {}", e);
                false
            }
        }
    }

    /// Fetches every tournament, in stored order.
    ///
    /// A bucket without a tournaments document yet is an empty list, not an error.
    pub async fn list(&self) -> Result<Vec<Tournament>, StoreError> {
        let body = match self.storage.get_object(&self.bucket, TOURNAMENTS_KEY).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!(bucket = %self.bucket, "No tournaments document yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                error!(bucket = %self.bucket, "Error fetching tournaments: {}", e);
                return Err(e);
            }
        };

        let tournaments: Vec<Tournament> = serde_json::from_slice(&body).map_err(|e| {
            error!(bucket = %self.bucket, "Error parsing tournaments: {}", e);
            StoreError::from(e)
        })?;
        debug!(bucket = %self.bucket, count = tournaments.len(), "Fetched tournaments");

        Ok(tournaments)
    }
}

/// Read-write access to the tournaments document, for authenticated admins.
///
/// Every mutation reads the whole document, changes it in memory and writes the whole document
/// back. Nothing guards against another writer in between, so concurrent mutations can silently
/// overwrite each other: the last write wins.
#[derive(Debug, Clone)]
pub struct AdminStore<S> {
    inner: TournamentStore<S>,
}

impl<S: ObjectStorage> AdminStore<S> {
    pub fn new(storage: S, bucket: impl Into<String>) -> Self {
        Self {
            inner: TournamentStore::new(storage, bucket),
        }
    }

    /// Builds a store against the credential's own bucket.
    pub fn connect<C>(connector: &C, credential: &Credential) -> Result<Self, StoreError>
    where
        C: Connect<Storage = S>,
    {
        Ok(Self::new(
            connector.authorized(credential)?,
            credential.bucket.clone(),
        ))
    }

    pub fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    pub async fn validate(&self) -> bool {
        self.inner.validate().await
    }

    pub async fn list(&self) -> Result<Vec<Tournament>, StoreError> {
        self.inner.list().await
    }

    /// Appends a tournament. Ids are not checked for uniqueness.
    pub async fn create(&self, tournament: Tournament) -> Result<(), StoreError> {
        let mut tournaments = self.list().await?;
        info!(id = %tournament.id, name = %tournament.name, "Adding tournament");
        tournaments.push(tournament);
        self.save(&tournaments).await
    }

    /// Replaces the first tournament with the same id, keeping its position.
    ///
    /// If no tournament has that id nothing is written and no error is returned.
    pub async fn update(&self, tournament: Tournament) -> Result<(), StoreError> {
        let mut tournaments = self.list().await?;
        match tournaments.iter_mut().find(|t| t.id == tournament.id) {
            Some(existing) => {
                info!(id = %tournament.id, "Updating tournament");
                *existing = tournament;
                self.save(&tournaments).await
            }
            None => {
                debug!(id = %tournament.id, "No tournament to update");
                Ok(())
            }
        }
    }

    /// Removes every tournament with the given id. The document is written back even if none matched.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tournaments = self.list().await?;
        tournaments.retain(|t| t.id != id);
        info!(id, "Deleting tournament");
        self.save(&tournaments).await
    }

    async fn save(&self, tournaments: &[Tournament]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(tournaments)?;
        self.inner
            .storage
            .put_object(
                &self.inner.bucket,
                TOURNAMENTS_KEY,
                body,
                CONTENT_TYPE,
                ObjectAcl::PublicRead,
            )
            .await
            .map_err(|e| {
                error!(bucket = %self.inner.bucket, "Error saving tournaments: {}", e);
                e
            })
    }
}

/// The store as a caller holds it: read-only for visitors, read-write once an admin signed in.
#[derive(Debug, Clone)]
pub enum StoreHandle<S> {
    Anonymous(TournamentStore<S>),
    Authorized(AdminStore<S>),
}

impl<S: ObjectStorage> StoreHandle<S> {
    /// Opens the authorized store when a credential is present and the public one otherwise.
    pub fn open<C>(
        connector: &C,
        config: &PublicBucketConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, StoreError>
    where
        C: Connect<Storage = S>,
    {
        match credential {
            Some(credential) => Ok(StoreHandle::Authorized(AdminStore::connect(
                connector, credential,
            )?)),
            None => Ok(StoreHandle::Anonymous(TournamentStore::new(
                connector.anonymous(config)?,
                config.bucket.clone(),
            ))),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, StoreHandle::Authorized(_))
    }

    /// The writable store, or `Unauthorized` without touching the network.
    pub fn admin(&self) -> Result<&AdminStore<S>, StoreError> {
        match self {
            StoreHandle::Authorized(store) => Ok(store),
            StoreHandle::Anonymous(_) => Err(StoreError::Unauthorized),
        }
    }

    pub async fn validate(&self) -> bool {
        match self {
            StoreHandle::Anonymous(store) => store.validate().await,
            StoreHandle::Authorized(store) => store.validate().await,
        }
    }

    pub async fn list(&self) -> Result<Vec<Tournament>, StoreError> {
        match self {
            StoreHandle::Anonymous(store) => store.list().await,
            StoreHandle::Authorized(store) => store.list().await,
        }
    }

    pub async fn create(&self, tournament: Tournament) -> Result<(), StoreError> {
        self.admin()?.create(tournament).await
    }

    pub async fn update(&self, tournament: Tournament) -> Result<(), StoreError> {
        self.admin()?.update(tournament).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.admin()?.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::TournamentStatus, storage::MemoryStorage};

    fn cup(id: &str, name: &str) -> Tournament {
        Tournament {
            id: id.to_string(),
            name: name.to_string(),
            start_date: "2024-01-01".parse().unwrap(),
            end_date: "2024-01-02".parse().unwrap(),
            status: TournamentStatus::Finished,
            description: None,
            participants: None,
            winner: None,
        }
    }

    #[tokio::test]
    async fn writes_pretty_public_json() {
        let storage = MemoryStorage::with_bucket("cups");
        let store = AdminStore::new(storage.clone(), "cups");
        store.create(cup("1", "Cup A")).await.unwrap();

        let object = storage.object("cups", TOURNAMENTS_KEY).unwrap();
        assert_eq!(object.content_type, "application/json");
        assert_eq!(object.acl, ObjectAcl::PublicRead);
        assert_eq!(
            String::from_utf8(object.body).unwrap(),
            "[\n  {\n    \"id\": \"1\",\n    \"name\": \"Cup A\",\n    \"startDate\": \"2024-01-01\",\n    \
             \"endDate\": \"2024-01-02\",\n    \"status\": \"finished\"\n  }\n]"
        );
    }

    #[tokio::test]
    async fn empty_body_is_malformed() {
        let storage = MemoryStorage::with_bucket("cups");
        storage.insert_object("cups", TOURNAMENTS_KEY, Vec::new());
        let store = TournamentStore::new(storage, "cups");
        assert!(matches!(
            store.list().await,
            Err(StoreError::MalformedDocument(_))
        ));
    }

    #[tokio::test]
    async fn failed_reads_abort_mutations() {
        let storage = MemoryStorage::with_bucket("cups");
        storage.set_offline(true);
        let store = AdminStore::new(storage.clone(), "cups");

        assert!(matches!(
            store.delete("1").await,
            Err(StoreError::Transport(_))
        ));
        assert_eq!(storage.calls().put_object, 0);
    }

    #[tokio::test]
    async fn open_picks_the_variant_from_the_credential() {
        let storage = MemoryStorage::with_bucket("cups");
        let config = PublicBucketConfig::new("storage.example.net", "eu-central-1", "public");
        let credential: Credential = "AKID:secret:storage.example.net:eu:cups".parse().unwrap();

        let anonymous = StoreHandle::open(&storage, &config, None).unwrap();
        assert!(!anonymous.is_admin());

        let authorized = StoreHandle::open(&storage, &config, Some(&credential)).unwrap();
        assert!(authorized.is_admin());
        assert_eq!(authorized.admin().unwrap().bucket(), "cups");
    }
}
