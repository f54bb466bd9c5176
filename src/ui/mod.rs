//! Purpose: Rendering-independent model of the browser UI plus the embedded entry page.
//! Exports: `panel` (list/detail state machine), `form` (creation form), `INDEX_HTML`, UI strings.
//! Role: `ui/index.html` implements these transitions in the browser; the server serves it at `/`.
//! Invariants: UI text constants here match the strings used by `ui/index.html`.
pub mod form;
pub mod panel;

pub use form::{CreationForm, FormRow, SaveRequest};
pub use panel::{DetailView, DraftRow, EditDraft, Effect, ListView, Panel, PanelEvent, SetButton, SetView};

pub const INDEX_HTML: &str = include_str!("../../ui/index.html");

pub const API_BASE: &str = "/api/flashcard-sets";
pub const UNTITLED: &str = "(Untitled)";
pub const DELETE_CONFIRM: &str = "Delete this set? This cannot be undone.";
pub const UPDATE_FAILED_ALERT: &str = "Error updating set";
pub const DELETE_FAILED_ALERT: &str = "Error deleting set";
pub const SAVE_FAILED_ALERT: &str = "Error saving set";
pub const UPDATED_ALERT: &str = "Updated!";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CardText {
    pub term: String,
    pub definition: String,
}

/// Builds list buttons from a `GET /api/flashcard-sets` body.
pub fn set_buttons(list_body: &serde_json::Value) -> Result<Vec<SetButton>, String> {
    let items = list_body
        .get("items")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| "list response has no items".to_string())?;
    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?.to_string();
            let label = item
                .get("title")
                .and_then(serde_json::Value::as_str)
                .filter(|title| !title.is_empty())
                .unwrap_or(UNTITLED)
                .to_string();
            Some(SetButton { id, label })
        })
        .collect())
}

/// Builds the read-only view from a `GET /api/flashcard-sets/:id` body.
pub fn set_view(id: &str, set_body: &serde_json::Value) -> SetView {
    let text = |value: Option<&serde_json::Value>| {
        value
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let cards = set_body
        .get("cards")
        .and_then(serde_json::Value::as_array)
        .map(|cards| {
            cards
                .iter()
                .map(|card| CardText {
                    term: text(card.get("term")),
                    definition: text(card.get("definition")),
                })
                .collect()
        })
        .unwrap_or_default();
    SetView {
        id: id.to_string(),
        title: text(set_body.get("title")),
        description: text(set_body.get("description")),
        cards,
    }
}
