//! Purpose: In-process flashcard-set store with the same semantics as the MongoDB backend.
//! Exports: `MemoryStore`.
//! Role: Backend for `memory://` URIs; used by local runs and the test suites.
//! Invariants: Each call holds the map lock for its whole duration (per-call atomicity).
//! Invariants: Listing orders by `created_at` descending, newest id first on ties.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind};
use crate::core::model::{FlashcardSet, SetId, SetInput, SetPage};
use crate::core::query::ListQuery;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    sets: Arc<Mutex<HashMap<SetId, FlashcardSet>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, input: SetInput, now: OffsetDateTime) -> Result<SetId, Error> {
        let id = SetId::generate();
        let set = FlashcardSet {
            id,
            title: input.title,
            description: input.description,
            cards: input.cards,
            created_at: now,
            updated_at: None,
        };
        self.lock()?.insert(id, set);
        Ok(id)
    }

    pub fn list(&self, query: &ListQuery) -> Result<SetPage, Error> {
        let sets = self.lock()?;
        let mut matching: Vec<&FlashcardSet> =
            sets.values().filter(|set| query.matches(set)).collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .map(FlashcardSet::summary)
            .collect();
        Ok(SetPage { items, total })
    }

    pub fn find(&self, id: SetId) -> Result<Option<FlashcardSet>, Error> {
        Ok(self.lock()?.get(&id).cloned())
    }

    pub fn replace(&self, id: SetId, input: SetInput, now: OffsetDateTime) -> Result<bool, Error> {
        let mut sets = self.lock()?;
        let Some(set) = sets.get_mut(&id) else {
            return Ok(false);
        };
        set.title = input.title;
        set.description = input.description;
        set.cards = input.cards;
        set.updated_at = Some(now);
        Ok(true)
    }

    pub fn delete(&self, id: SetId) -> Result<bool, Error> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SetId, FlashcardSet>>, Error> {
        self.sets
            .lock()
            .map_err(|_| Error::new(ErrorKind::Store).with_message("memory store lock poisoned"))
    }
}
