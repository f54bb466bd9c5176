//! Purpose: Model the standalone creation form of the browser UI.
//! Exports: `CreationForm`, `FormRow`, `SaveRequest`.
//! Role: Row numbering, submission assembly, and in-flight guarding mirrored by `ui/index.html`.
//! Invariants: Row numbers start at 1 and are never reused, even after rows are removed.
//! Invariants: At most one save is in flight; the form keeps its contents when a save fails.
use serde_json::{Value, json};

use super::{API_BASE, SAVE_FAILED_ALERT, UPDATED_ALERT};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormRow {
    pub number: u32,
    pub term: String,
    pub definition: String,
}

impl FormRow {
    pub fn title(&self) -> String {
        format!("Card {}", self.number)
    }

    pub fn term_id(&self) -> String {
        format!("card-term-{}", self.number)
    }

    pub fn definition_id(&self) -> String {
        format!("card-def-{}", self.number)
    }

    pub fn term_name(&self) -> String {
        format!("cards[{}][term]", self.number - 1)
    }

    pub fn definition_name(&self) -> String {
        format!("cards[{}][definition]", self.number - 1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaveRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreationForm {
    pub title: String,
    pub description: String,
    pub rows: Vec<FormRow>,
    next_number: u32,
    editing_id: Option<String>,
    saving: bool,
}

impl Default for CreationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationForm {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            rows: Vec::new(),
            next_number: 1,
            editing_id: None,
            saving: false,
        }
    }

    pub fn add_row(&mut self) -> &FormRow {
        let number = self.next_number;
        self.next_number += 1;
        self.rows.push(FormRow {
            number,
            term: String::new(),
            definition: String::new(),
        });
        &self.rows[self.rows.len() - 1]
    }

    pub fn remove_row(&mut self, number: u32) {
        self.rows.retain(|row| row.number != number);
    }

    pub fn set_term(&mut self, number: u32, text: impl Into<String>) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.number == number) {
            row.term = text.into();
        }
    }

    pub fn set_definition(&mut self, number: u32, text: impl Into<String>) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.number == number) {
            row.definition = text.into();
        }
    }

    /// Turns the next save into an update of `id`.
    pub fn stash_editing_id(&mut self, id: impl Into<String>) {
        self.editing_id = Some(id.into());
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Returns `None` while a previous save is still in flight.
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        if self.saving {
            return None;
        }
        self.saving = true;
        let cards: Vec<Value> = self
            .rows
            .iter()
            .map(|row| json!({ "term": row.term, "definition": row.definition }))
            .collect();
        let body = json!({
            "title": self.title,
            "description": self.description,
            "cards": cards,
        });
        let request = match &self.editing_id {
            Some(id) => SaveRequest {
                method: "PATCH",
                path: format!("{API_BASE}/{id}"),
                body,
            },
            None => SaveRequest {
                method: "POST",
                path: API_BASE.to_string(),
                body,
            },
        };
        Some(request)
    }

    /// Settles the in-flight save and returns the alert text to show.
    /// `Ok` carries the id reported by the server.
    pub fn finish_save(&mut self, result: Result<String, String>) -> String {
        self.saving = false;
        match result {
            Ok(id) => match self.editing_id.take() {
                Some(_) => UPDATED_ALERT.to_string(),
                None => format!("Saved! id: {id}"),
            },
            Err(_) => SAVE_FAILED_ALERT.to_string(),
        }
    }
}
