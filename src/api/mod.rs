//! Purpose: Define the public Rust API for the flashcard-set service.
//! Exports: `FlashcardService`, JSON renderers, and the shared error and record types.
//! Role: Boundary used by the HTTP server binary and the integration tests.
//! Invariants: Handlers reach the store only through `FlashcardService`.

mod service;
mod wire;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::input::form_fields;
pub use crate::core::model::{Card, FlashcardSet, SetId, SetInput, SetPage, SetSummary};
pub use crate::core::query::{DEFAULT_LIMIT, ListParams, ListQuery, MAX_LIMIT, MAX_SKIP};
pub use service::{
    DELETE_FAILED, FETCH_FAILED, FlashcardService, LIST_FAILED, SAVE_FAILED, SET_NOT_FOUND,
    UPDATE_FAILED,
};
pub use wire::{id_json, page_json, set_json, summary_json};
