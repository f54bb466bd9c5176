//! Purpose: Define the flashcard-set records shared by every store backend.
//! Exports: `SetId`, `Card`, `SetInput`, `FlashcardSet`, `SetSummary`, `SetPage`, time helpers.
//! Role: Strict internal types; loose request JSON is converted in `core::input`.
//! Invariants: `Card::order` always equals the card's index in its set.
//! Invariants: Timestamps carry millisecond precision, matching the document store.
use mongodb::bson::oid::ObjectId;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description;

use super::error::{Error, ErrorKind};

/// Store-assigned identifier, rendered as 24 lowercase hex characters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SetId(ObjectId);

impl SetId {
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        if raw.len() != 24 {
            return Err(invalid_id());
        }
        ObjectId::parse_str(raw).map(Self).map_err(|_| invalid_id())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for SetId {
    fn from(value: ObjectId) -> Self {
        Self(value)
    }
}

impl FromStr for SetId {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn invalid_id() -> Error {
    Error::new(ErrorKind::InvalidId).with_message("invalid id")
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Card {
    pub term: String,
    pub definition: String,
    pub order: u32,
}

/// Cleaned create/update payload. Construct through `core::input::parse_set_input`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetInput {
    pub title: String,
    pub description: String,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlashcardSet {
    pub id: SetId,
    pub title: String,
    pub description: String,
    pub cards: Vec<Card>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl FlashcardSet {
    pub fn summary(&self) -> SetSummary {
        SetSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// List-view projection: everything except `cards`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetSummary {
    pub id: SetId,
    pub title: String,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SetPage {
    pub items: Vec<SetSummary>,
    pub total: u64,
}

const TIMESTAMP_FORMAT: &str =
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z";

pub fn now_millis() -> OffsetDateTime {
    from_unix_millis(unix_millis(OffsetDateTime::now_utc())).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn unix_millis(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid timestamp")
            .with_source(err)
    })
}

/// Always three sub-second digits and a `Z` suffix, so rendered values sort as text.
pub fn format_ts(ts: OffsetDateTime) -> Result<String, Error> {
    let format = format_description::parse(TIMESTAMP_FORMAT).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("timestamp format failed")
            .with_source(err)
    })?;
    ts.to_offset(time::UtcOffset::UTC).format(&format).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("timestamp format failed")
            .with_source(err)
    })
}
