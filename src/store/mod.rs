//! Purpose: Select and drive the document store behind the flashcard-set service.
//! Exports: `StoreConfig`, `StoreBackend`, `SetStore`, `MemoryStore`, `MongoStore`.
//! Role: One process-scoped handle, opened on start and closed on shutdown.
//! Invariants: The backend is chosen only from the connection string scheme.
//! Invariants: Store failures surface as `ErrorKind::Store`; callers decide what to expose.
mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use time::OffsetDateTime;
use url::Url;

use crate::core::error::{Error, ErrorKind};
use crate::core::model::{FlashcardSet, SetId, SetInput, SetPage};
use crate::core::query::ListQuery;

pub const DEFAULT_DB_NAME: &str = "Cluster0";
pub const DEFAULT_COLLECTION: &str = "flashcardSets";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreBackend {
    Memory,
    Mongo,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Mongo => "mongodb",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    pub uri: String,
    pub db_name: String,
    pub collection: String,
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: DEFAULT_DB_NAME.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn backend(&self) -> Result<StoreBackend, Error> {
        let url = Url::parse(self.uri.trim()).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("store connection string is not a valid URI")
                .with_hint("Use mongodb://host:27017, mongodb+srv://cluster/..., or memory://.")
                .with_source(err)
        })?;
        match url.scheme() {
            "memory" => Ok(StoreBackend::Memory),
            "mongodb" | "mongodb+srv" => Ok(StoreBackend::Mongo),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unsupported store scheme: {other}"))
                .with_hint("Use mongodb://, mongodb+srv://, or memory://.")),
        }
    }

    pub fn validate(&self) -> Result<StoreBackend, Error> {
        let backend = self.backend()?;
        if self.db_name.trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("database name must not be empty"));
        }
        if self.collection.trim().is_empty() {
            return Err(
                Error::new(ErrorKind::Usage).with_message("collection name must not be empty")
            );
        }
        Ok(backend)
    }
}

/// Shared store handle; cloning shares the underlying connection or map.
#[derive(Clone, Debug)]
pub enum SetStore {
    Memory(MemoryStore),
    Mongo(MongoStore),
}

impl SetStore {
    pub async fn open(config: &StoreConfig) -> Result<Self, Error> {
        match config.validate()? {
            StoreBackend::Memory => Ok(SetStore::Memory(MemoryStore::new())),
            StoreBackend::Mongo => {
                let store =
                    MongoStore::connect(config.uri.trim(), &config.db_name, &config.collection)
                        .await?;
                Ok(SetStore::Mongo(store))
            }
        }
    }

    pub fn memory() -> Self {
        SetStore::Memory(MemoryStore::new())
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            SetStore::Memory(_) => StoreBackend::Memory,
            SetStore::Mongo(_) => StoreBackend::Mongo,
        }
    }

    pub async fn insert(&self, input: SetInput, now: OffsetDateTime) -> Result<SetId, Error> {
        match self {
            SetStore::Memory(store) => store.insert(input, now),
            SetStore::Mongo(store) => store.insert(input, now).await,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<SetPage, Error> {
        match self {
            SetStore::Memory(store) => store.list(query),
            SetStore::Mongo(store) => store.list(query).await,
        }
    }

    pub async fn find(&self, id: SetId) -> Result<Option<FlashcardSet>, Error> {
        match self {
            SetStore::Memory(store) => store.find(id),
            SetStore::Mongo(store) => store.find(id).await,
        }
    }

    /// Returns `false` when no document matched `id`.
    pub async fn replace(
        &self,
        id: SetId,
        input: SetInput,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        match self {
            SetStore::Memory(store) => store.replace(id, input, now),
            SetStore::Mongo(store) => store.replace(id, input, now).await,
        }
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: SetId) -> Result<bool, Error> {
        match self {
            SetStore::Memory(store) => store.delete(id),
            SetStore::Mongo(store) => store.delete(id).await,
        }
    }

    pub async fn close(self) {
        match self {
            SetStore::Memory(_) => {}
            SetStore::Mongo(store) => store.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SetStore, StoreBackend, StoreConfig};
    use crate::core::error::ErrorKind;

    #[test]
    fn backend_is_selected_by_scheme() {
        let cases = [
            ("memory://", StoreBackend::Memory),
            ("mongodb://localhost:27017", StoreBackend::Mongo),
            ("mongodb+srv://user:pw@cluster0.example.net/?retryWrites=true", StoreBackend::Mongo),
        ];
        for (uri, expected) in cases {
            assert_eq!(StoreConfig::new(uri).backend().expect(uri), expected);
        }
    }

    #[test]
    fn unknown_schemes_and_garbage_are_usage_errors() {
        for uri in ["postgres://localhost/db", "not a uri", ""] {
            let err = StoreConfig::new(uri).backend().expect_err(uri);
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[test]
    fn empty_names_fail_validation() {
        let err = StoreConfig::new("memory://")
            .with_db_name(" ")
            .validate()
            .expect_err("empty db");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = StoreConfig::new("memory://")
            .with_collection("")
            .validate()
            .expect_err("empty collection");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[tokio::test]
    async fn memory_uri_opens_without_network() {
        let store = SetStore::open(&StoreConfig::new("memory://"))
            .await
            .expect("open");
        assert_eq!(store.backend(), StoreBackend::Memory);
        store.close().await;
    }
}
