/// Scouting data models
///
/// Document references, field paths, teams, and the values written by
/// the sharing service.

mod deletion;

pub use deletion::{QueuedDeletion, ShareKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection holding team documents
pub const TEAMS_COLLECTION: &str = "teams";
/// Collection holding template documents
pub const TEMPLATES_COLLECTION: &str = "templates";
/// Collection holding one deletion queue document per user
pub const DELETION_QUEUE_COLLECTION: &str = "deletionQueue";

/// Field name of the per-record active share token map
pub const FIELD_ACTIVE_TOKENS: &str = "activeTokens";
/// Field name of the per-record owner map, keyed by uid
pub const FIELD_OWNERS: &str = "owners";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_IDS: &str = "ids";

/// Address of a document in the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self::new(TEAMS_COLLECTION, id)
    }

    pub fn template(id: impl Into<String>) -> Self {
        Self::new(TEMPLATES_COLLECTION, id)
    }

    /// The deletion queue document owned by a user
    pub fn deletion_queue(uid: impl Into<String>) -> Self {
        Self::new(DELETION_QUEUE_COLLECTION, uid)
    }

    /// Slash separated path, e.g. `teams/abc123`
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// Parse a `collection/id` path
    pub fn parse(path: &str) -> Option<Self> {
        let (collection, id) = path.rsplit_once('/')?;
        if collection.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(collection, id))
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Path to a (possibly nested) field inside a document
///
/// Segments are kept apart so keys containing dots, like generated
/// tokens, never get split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Opaque capability handed out when records are shared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scouted competition team
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub number: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Remote image URL or a local file path
    #[serde(default)]
    pub media: Option<String>,
}

impl Team {
    pub fn reference(&self) -> DocumentRef {
        DocumentRef::team(&self.id)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => write!(f, "{} - {}", self.number, name),
            None => write!(f, "{}", self.number),
        }
    }
}

/// New owner value sent to the `updateOwners` function
///
/// Serializes as a single `number` or `timestamp` (epoch millis) entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerValue {
    #[serde(rename = "number")]
    Number(i64),
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    Timestamp(DateTime<Utc>),
}

impl From<i64> for OwnerValue {
    fn from(number: i64) -> Self {
        OwnerValue::Number(number)
    }
}

impl From<DateTime<Utc>> for OwnerValue {
    fn from(timestamp: DateTime<Utc>) -> Self {
        OwnerValue::Timestamp(timestamp)
    }
}

/// Payload of one `updateOwners` call
#[derive(Debug, Clone, Serialize)]
pub struct OwnerUpdateRequest {
    pub token: ShareToken,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "prevUid")]
    pub prev_uid: Option<String>,
    #[serde(flatten)]
    pub value: OwnerValue,
}
