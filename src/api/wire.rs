//! Purpose: Render flashcard-set records as the JSON bodies returned over HTTP.
//! Exports: `set_json`, `summary_json`, `page_json`, `id_json`.
//! Role: Single place that fixes response field names and shapes.
//! Invariants: Single-set bodies carry only `title`, `description`, `cards`.
//! Invariants: Summaries never include `cards`; `updatedAt` is omitted until the first update.
use serde_json::{Map, Value, json};

use crate::core::error::Error;
use crate::core::model::{Card, FlashcardSet, SetId, SetPage, SetSummary, format_ts};

pub fn id_json(id: SetId) -> Value {
    json!({ "id": id.to_hex() })
}

pub fn set_json(set: &FlashcardSet) -> Value {
    json!({
        "title": set.title,
        "description": set.description,
        "cards": set.cards.iter().map(card_json).collect::<Vec<_>>(),
    })
}

pub fn summary_json(summary: &SetSummary) -> Result<Value, Error> {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(summary.id.to_hex()));
    map.insert("title".to_string(), json!(summary.title));
    map.insert("description".to_string(), json!(summary.description));
    map.insert(
        "createdAt".to_string(),
        json!(format_ts(summary.created_at)?),
    );
    if let Some(updated_at) = summary.updated_at {
        map.insert("updatedAt".to_string(), json!(format_ts(updated_at)?));
    }
    Ok(Value::Object(map))
}

pub fn page_json(page: &SetPage) -> Result<Value, Error> {
    let items = page
        .items
        .iter()
        .map(summary_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "items": items, "total": page.total }))
}

fn card_json(card: &Card) -> Value {
    json!({
        "term": card.term,
        "definition": card.definition,
        "order": card.order,
    })
}
