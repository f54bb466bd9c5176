//! Purpose: Implement the five flashcard-set operations on top of a `SetStore`.
//! Exports: `FlashcardService` and the caller-facing failure messages.
//! Role: Validation first, then one store call; the HTTP layer only maps results to responses.
//! Invariants: Id and body validation happen before any store access.
//! Invariants: Store faults are logged with detail and replaced by a stable per-operation message.
use serde_json::Value;
use tracing::error;

use crate::core::error::{Error, ErrorKind};
use crate::core::input::parse_set_input;
use crate::core::model::{FlashcardSet, SetId, SetPage, now_millis};
use crate::core::query::ListQuery;
use crate::store::SetStore;

pub const SAVE_FAILED: &str = "failed to save set";
pub const LIST_FAILED: &str = "failed to list sets";
pub const FETCH_FAILED: &str = "failed to fetch set";
pub const UPDATE_FAILED: &str = "failed to update set";
pub const DELETE_FAILED: &str = "failed to delete set";
pub const SET_NOT_FOUND: &str = "Set not found";

#[derive(Clone, Debug)]
pub struct FlashcardService {
    store: SetStore,
}

impl FlashcardService {
    pub fn new(store: SetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SetStore {
        &self.store
    }

    pub fn into_store(self) -> SetStore {
        self.store
    }

    pub async fn create(&self, body: &Value) -> Result<SetId, Error> {
        let input = parse_set_input(body)?;
        self.store
            .insert(input, now_millis())
            .await
            .map_err(|err| conceal("create", SAVE_FAILED, err))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<SetPage, Error> {
        self.store
            .list(query)
            .await
            .map_err(|err| conceal("list", LIST_FAILED, err))
    }

    pub async fn get(&self, id: &str) -> Result<FlashcardSet, Error> {
        let id = SetId::parse(id)?;
        match self.store.find(id).await {
            Ok(Some(set)) => Ok(set),
            Ok(None) => Err(not_found()),
            Err(err) => Err(conceal("get", FETCH_FAILED, err)),
        }
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<SetId, Error> {
        let id = SetId::parse(id)?;
        let input = parse_set_input(body)?;
        match self.store.replace(id, input, now_millis()).await {
            Ok(true) => Ok(id),
            Ok(false) => Err(not_found()),
            Err(err) => Err(conceal("update", UPDATE_FAILED, err)),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let id = SetId::parse(id)?;
        match self.store.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(not_found()),
            Err(err) => Err(conceal("delete", DELETE_FAILED, err)),
        }
    }
}

fn not_found() -> Error {
    Error::new(ErrorKind::NotFound).with_message(SET_NOT_FOUND)
}

fn conceal(op: &'static str, message: &'static str, err: Error) -> Error {
    let cause = std::error::Error::source(&err)
        .map(ToString::to_string)
        .unwrap_or_default();
    error!(op, error = %err, cause, "store operation failed");
    Error::new(ErrorKind::Internal)
        .with_message(message)
        .with_source(err)
}
