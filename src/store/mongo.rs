//! Purpose: MongoDB-backed flashcard-set store.
//! Exports: `MongoStore`.
//! Role: Backend for `mongodb://` and `mongodb+srv://` URIs; owns the shared driver client.
//! Invariants: Documents keep the field names `title`, `description`, `cards`, `createdAt`, `updatedAt`.
//! Invariants: Search terms are regex-escaped so matching stays a literal substring test.
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_stream::StreamExt;

use crate::core::error::{Error, ErrorKind};
use crate::core::model::{
    Card, FlashcardSet, SetId, SetInput, SetPage, SetSummary, from_unix_millis, unix_millis,
};
use crate::core::query::ListQuery;

#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    sets: Collection<SetDocument>,
    summaries: Collection<SummaryDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CardDocument {
    #[serde(default)]
    term: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    order: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SetDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cards: Vec<CardDocument>,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    updated_at: Option<bson::DateTime>,
}

#[derive(Debug, Deserialize)]
struct SummaryDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<bson::DateTime>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str, collection: &str) -> Result<Self, Error> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|err| store_error("invalid store connection string", err))?;
        let database = client.database(db_name);
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|err| store_error("store ping failed", err))?;
        let sets = database.collection::<SetDocument>(collection);
        let summaries = sets.clone_with_type::<SummaryDocument>();
        Ok(Self {
            client,
            sets,
            summaries,
        })
    }

    pub async fn insert(&self, input: SetInput, now: OffsetDateTime) -> Result<SetId, Error> {
        let document = SetDocument {
            id: None,
            title: input.title,
            description: input.description,
            cards: input.cards.into_iter().map(card_document).collect(),
            created_at: bson::DateTime::from_millis(unix_millis(now)),
            updated_at: None,
        };
        let result = self
            .sets
            .insert_one(document)
            .await
            .map_err(|err| store_error("insert failed", err))?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(SetId::from(id)),
            other => Err(Error::new(ErrorKind::Store)
                .with_message(format!("store returned a non-ObjectId id: {other}"))),
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<SetPage, Error> {
        let filter = search_filter(query.search.as_deref());
        let mut cursor = self
            .summaries
            .find(filter.clone())
            .projection(doc! { "cards": 0 })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(query.skip)
            .limit(i64::from(query.limit))
            .await
            .map_err(|err| store_error("find failed", err))?;

        let mut items = Vec::new();
        while let Some(document) = cursor.next().await {
            let document = document.map_err(|err| store_error("cursor read failed", err))?;
            items.push(summary_from_document(document)?);
        }

        let total = self
            .sets
            .count_documents(filter)
            .await
            .map_err(|err| store_error("count failed", err))?;
        Ok(SetPage { items, total })
    }

    pub async fn find(&self, id: SetId) -> Result<Option<FlashcardSet>, Error> {
        let document = self
            .sets
            .find_one(doc! { "_id": id.object_id() })
            .await
            .map_err(|err| store_error("find failed", err))?;
        document.map(|document| set_from_document(id, document)).transpose()
    }

    pub async fn replace(
        &self,
        id: SetId,
        input: SetInput,
        now: OffsetDateTime,
    ) -> Result<bool, Error> {
        let result = self
            .sets
            .update_one(doc! { "_id": id.object_id() }, update_document(input, now))
            .await
            .map_err(|err| store_error("update failed", err))?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, id: SetId) -> Result<bool, Error> {
        let result = self
            .sets
            .delete_one(doc! { "_id": id.object_id() })
            .await
            .map_err(|err| store_error("delete failed", err))?;
        Ok(result.deleted_count > 0)
    }

    pub async fn close(self) {
        self.client.shutdown().await;
    }
}

fn search_filter(search: Option<&str>) -> Document {
    let Some(term) = search else {
        return Document::new();
    };
    let pattern = regex::escape(term);
    let clause = |field: &str| doc! { field: { "$regex": pattern.as_str(), "$options": "i" } };
    doc! {
        "$or": [
            clause("title"),
            clause("description"),
            clause("cards.term"),
            clause("cards.definition"),
        ]
    }
}

fn update_document(input: SetInput, now: OffsetDateTime) -> Document {
    let cards: Vec<Document> = input
        .cards
        .iter()
        .map(|card| {
            doc! {
                "term": card.term.as_str(),
                "definition": card.definition.as_str(),
                "order": i64::from(card.order),
            }
        })
        .collect();
    doc! {
        "$set": {
            "title": input.title,
            "description": input.description,
            "cards": cards,
            "updatedAt": bson::DateTime::from_millis(unix_millis(now)),
        }
    }
}

fn card_document(card: Card) -> CardDocument {
    CardDocument {
        term: card.term,
        definition: card.definition,
        order: i64::from(card.order),
    }
}

fn set_from_document(id: SetId, document: SetDocument) -> Result<FlashcardSet, Error> {
    Ok(FlashcardSet {
        id,
        title: document.title,
        description: document.description,
        cards: document
            .cards
            .into_iter()
            .map(|card| Card {
                term: card.term,
                definition: card.definition,
                order: u32::try_from(card.order).unwrap_or_default(),
            })
            .collect(),
        created_at: from_unix_millis(document.created_at.timestamp_millis())?,
        updated_at: document
            .updated_at
            .map(|ts| from_unix_millis(ts.timestamp_millis()))
            .transpose()?,
    })
}

fn summary_from_document(document: SummaryDocument) -> Result<SetSummary, Error> {
    Ok(SetSummary {
        id: SetId::from(document.id),
        title: document.title,
        description: document.description,
        created_at: from_unix_millis(document.created_at.timestamp_millis())?,
        updated_at: document
            .updated_at
            .map(|ts| from_unix_millis(ts.timestamp_millis()))
            .transpose()?,
    })
}

fn store_error(message: &str, err: mongodb::error::Error) -> Error {
    Error::new(ErrorKind::Store)
        .with_message(message)
        .with_source(err)
}
