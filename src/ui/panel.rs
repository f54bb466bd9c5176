//! Purpose: Model the list/detail panel of the browser UI as an explicit state machine.
//! Exports: `Panel`, `ListView`, `DetailView`, `SetView`, `EditDraft`, `PanelEvent`, `Effect`.
//! Role: Rendering-independent transitions mirrored by `ui/index.html`.
//! Invariants: Every network call is requested as an `Effect`; the panel never performs I/O.
//! Invariants: A failed save or delete leaves the visible state (and any open draft) untouched.
//! Invariants: While a save or delete is in flight further save/delete events are ignored.
use serde_json::{Value, json};

use super::{API_BASE, CardText, DELETE_CONFIRM, DELETE_FAILED_ALERT, UPDATE_FAILED_ALERT};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetButton {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ListView {
    Loading,
    Empty,
    Failed,
    Sets(Vec<SetButton>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cards: Vec<CardText>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DraftRow {
    pub key: u32,
    pub term: String,
    pub definition: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EditDraft {
    pub source: SetView,
    pub title: String,
    pub description: String,
    pub rows: Vec<DraftRow>,
    next_key: u32,
}

impl EditDraft {
    fn from_view(view: &SetView) -> Self {
        let mut draft = Self {
            source: view.clone(),
            title: view.title.clone(),
            description: view.description.clone(),
            rows: Vec::new(),
            next_key: 0,
        };
        if view.cards.is_empty() {
            draft.add_row(String::new(), String::new());
        }
        for card in &view.cards {
            draft.add_row(card.term.clone(), card.definition.clone());
        }
        draft
    }

    fn add_row(&mut self, term: String, definition: String) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        self.rows.push(DraftRow {
            key,
            term,
            definition,
        });
        key
    }

    /// PATCH body: trimmed title, raw description, rows in display order.
    pub fn body(&self) -> Value {
        let cards: Vec<Value> = self
            .rows
            .iter()
            .map(|row| json!({ "term": row.term, "definition": row.definition }))
            .collect();
        json!({
            "title": self.title.trim(),
            "description": self.description,
            "cards": cards,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DetailView {
    Blank,
    Loading { id: String },
    Viewing(SetView),
    Editing(EditDraft),
    Failed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PanelEvent {
    Load,
    ListLoaded(Result<Vec<SetButton>, String>),
    Select { id: String },
    SetLoaded(Result<SetView, String>),
    Edit,
    AddRow,
    RemoveRow { key: u32 },
    EditTitle(String),
    EditDescription(String),
    EditTerm { key: u32, text: String },
    EditDefinition { key: u32, text: String },
    Cancel,
    Save,
    SaveFinished(Result<(), String>),
    Delete,
    DeleteConfirmed(bool),
    DeleteFinished(Result<(), String>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Request {
        method: &'static str,
        path: String,
        body: Option<Value>,
    },
    Confirm(&'static str),
    Alert(&'static str),
}

impl Effect {
    fn fetch_list() -> Self {
        Effect::Request {
            method: "GET",
            path: API_BASE.to_string(),
            body: None,
        }
    }

    fn fetch_set(id: &str) -> Self {
        Effect::Request {
            method: "GET",
            path: format!("{API_BASE}/{id}"),
            body: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub list: ListView,
    pub detail: DetailView,
    in_flight: bool,
    // Title/description to show once the post-save fetch lands.
    pending_labels: Option<(String, String)>,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel {
    pub fn new() -> Self {
        Self {
            list: ListView::Loading,
            detail: DetailView::Blank,
            in_flight: false,
            pending_labels: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn apply(&mut self, event: PanelEvent) -> Vec<Effect> {
        match event {
            PanelEvent::Load => self.load(),
            PanelEvent::ListLoaded(Ok(buttons)) => {
                self.list = if buttons.is_empty() {
                    ListView::Empty
                } else {
                    ListView::Sets(buttons)
                };
                Vec::new()
            }
            PanelEvent::ListLoaded(Err(_)) => {
                self.list = ListView::Failed;
                Vec::new()
            }
            PanelEvent::Select { id } => {
                let effect = Effect::fetch_set(&id);
                self.pending_labels = None;
                self.detail = DetailView::Loading { id };
                vec![effect]
            }
            PanelEvent::SetLoaded(result) => {
                if !matches!(self.detail, DetailView::Loading { .. }) {
                    return Vec::new();
                }
                let labels = self.pending_labels.take();
                self.detail = match result {
                    Ok(mut view) => {
                        if let Some((title, description)) = labels {
                            view.title = title;
                            view.description = description;
                        }
                        DetailView::Viewing(view)
                    }
                    Err(_) => DetailView::Failed,
                };
                Vec::new()
            }
            PanelEvent::Edit => {
                if let DetailView::Viewing(view) = &self.detail {
                    self.detail = DetailView::Editing(EditDraft::from_view(view));
                }
                Vec::new()
            }
            PanelEvent::AddRow => {
                if let DetailView::Editing(draft) = &mut self.detail {
                    draft.add_row(String::new(), String::new());
                }
                Vec::new()
            }
            PanelEvent::RemoveRow { key } => {
                if let DetailView::Editing(draft) = &mut self.detail {
                    draft.rows.retain(|row| row.key != key);
                }
                Vec::new()
            }
            PanelEvent::EditTitle(text) => {
                if let DetailView::Editing(draft) = &mut self.detail {
                    draft.title = text;
                }
                Vec::new()
            }
            PanelEvent::EditDescription(text) => {
                if let DetailView::Editing(draft) = &mut self.detail {
                    draft.description = text;
                }
                Vec::new()
            }
            PanelEvent::EditTerm { key, text } => {
                if let Some(row) = self.draft_row(key) {
                    row.term = text;
                }
                Vec::new()
            }
            PanelEvent::EditDefinition { key, text } => {
                if let Some(row) = self.draft_row(key) {
                    row.definition = text;
                }
                Vec::new()
            }
            PanelEvent::Cancel => {
                if let DetailView::Editing(draft) = &self.detail {
                    self.detail = DetailView::Viewing(draft.source.clone());
                }
                Vec::new()
            }
            PanelEvent::Save => self.save(),
            PanelEvent::SaveFinished(result) => self.save_finished(result),
            PanelEvent::Delete => {
                if self.in_flight || !matches!(self.detail, DetailView::Viewing(_)) {
                    return Vec::new();
                }
                vec![Effect::Confirm(DELETE_CONFIRM)]
            }
            PanelEvent::DeleteConfirmed(confirmed) => {
                let DetailView::Viewing(view) = &self.detail else {
                    return Vec::new();
                };
                if !confirmed || self.in_flight {
                    return Vec::new();
                }
                self.in_flight = true;
                vec![Effect::Request {
                    method: "DELETE",
                    path: format!("{API_BASE}/{}", view.id),
                    body: None,
                }]
            }
            PanelEvent::DeleteFinished(result) => {
                self.in_flight = false;
                match result {
                    Ok(()) => self.load(),
                    Err(_) => vec![Effect::Alert(DELETE_FAILED_ALERT)],
                }
            }
        }
    }

    fn load(&mut self) -> Vec<Effect> {
        self.list = ListView::Loading;
        self.detail = DetailView::Blank;
        vec![Effect::fetch_list()]
    }

    fn save(&mut self) -> Vec<Effect> {
        if self.in_flight {
            return Vec::new();
        }
        let DetailView::Editing(draft) = &self.detail else {
            return Vec::new();
        };
        self.in_flight = true;
        vec![Effect::Request {
            method: "PATCH",
            path: format!("{API_BASE}/{}", draft.source.id),
            body: Some(draft.body()),
        }]
    }

    fn save_finished(&mut self, result: Result<(), String>) -> Vec<Effect> {
        self.in_flight = false;
        let DetailView::Editing(draft) = &self.detail else {
            return Vec::new();
        };
        if result.is_err() {
            return vec![Effect::Alert(UPDATE_FAILED_ALERT)];
        }
        let id = draft.source.id.clone();
        let labels = (draft.title.trim().to_string(), draft.description.clone());
        let mut effects = self.load();
        effects.push(Effect::fetch_set(&id));
        self.pending_labels = Some(labels);
        self.detail = DetailView::Loading { id };
        effects
    }

    fn draft_row(&mut self, key: u32) -> Option<&mut DraftRow> {
        match &mut self.detail {
            DetailView::Editing(draft) => draft.rows.iter_mut().find(|row| row.key == key),
            _ => None,
        }
    }
}
