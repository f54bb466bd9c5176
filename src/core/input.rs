//! Purpose: Coerce loosely-typed request bodies into a strict `SetInput`.
//! Exports: `parse_set_input`, `clean_cards`, `form_fields`.
//! Role: Boundary validation for create and full-replace updates.
//! Invariants: Cards with an empty term and definition (after trim) are dropped.
//! Invariants: Surviving cards are re-indexed from 0 in submitted order.
//! Invariants: A successful result always has a non-empty title and at least one card.
//! Invariants: Form posts are rebuilt into the same JSON shape before validation.
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::error::{Error, ErrorKind};
use super::model::{Card, SetInput};

pub const MISSING_FIELDS: &str = "title and cards[] are required";
pub const NO_CARDS: &str = "cards must include at least one term/definition";

pub fn parse_set_input(body: &Value) -> Result<SetInput, Error> {
    let Some(fields) = body.as_object() else {
        return Err(validation(MISSING_FIELDS));
    };

    let title = fields.get("title").map(coerce_text).unwrap_or_default();
    let Some(cards) = fields.get("cards").and_then(Value::as_array) else {
        return Err(validation(MISSING_FIELDS));
    };
    if title.is_empty() {
        return Err(validation(MISSING_FIELDS));
    }

    let cards = clean_cards(cards);
    if cards.is_empty() {
        return Err(validation(NO_CARDS));
    }

    Ok(SetInput {
        title,
        description: fields
            .get("description")
            .map(coerce_text)
            .unwrap_or_default(),
        cards,
    })
}

pub fn clean_cards(raw: &[Value]) -> Vec<Card> {
    raw.iter()
        .filter_map(|card| {
            let term = card.get("term").map(coerce_text).unwrap_or_default();
            let definition = card.get("definition").map(coerce_text).unwrap_or_default();
            (!term.is_empty() || !definition.is_empty()).then_some((term, definition))
        })
        .enumerate()
        .map(|(order, (term, definition))| Card {
            term,
            definition,
            order: order as u32,
        })
        .collect()
}

/// Rebuilds an urlencoded form post (`title`, `description`, `cards[N][term]`,
/// `cards[N][definition]`) into the JSON body shape `parse_set_input` expects.
/// Cards are ordered by their bracket index; the first value of a repeated key wins.
pub fn form_fields<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut fields = Map::new();
    let mut cards: BTreeMap<u64, Map<String, Value>> = BTreeMap::new();
    let mut saw_cards = false;
    for (key, value) in pairs {
        if let Some((index, field)) = card_key(&key) {
            saw_cards = true;
            cards
                .entry(index)
                .or_default()
                .entry(field.to_string())
                .or_insert(Value::String(value));
        } else if key == "title" || key == "description" {
            fields.entry(key).or_insert(Value::String(value));
        }
    }
    if saw_cards {
        let cards = cards.into_values().map(Value::Object).collect();
        fields.insert("cards".to_string(), Value::Array(cards));
    }
    Value::Object(fields)
}

// "cards[3][term]" -> (3, "term")
fn card_key(key: &str) -> Option<(u64, &str)> {
    let rest = key.strip_prefix("cards[")?;
    let (index, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    if field != "term" && field != "definition" {
        return None;
    }
    Some((index.parse().ok()?, field))
}

// Scalars keep their JSON text; null, false, and containers count as empty.
fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn validation(message: &str) -> Error {
    Error::new(ErrorKind::Validation).with_message(message)
}
