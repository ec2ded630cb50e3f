/// Deletion queue entries
use super::{ShareToken, FIELD_IDS, FIELD_TIMESTAMP, FIELD_TYPE};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// What kind of record a share token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    Team,
    Template,
}

impl ShareKind {
    /// Numeric type code stored in the queue entry
    pub fn code(&self) -> i64 {
        match self {
            ShareKind::Team => 2,
            ShareKind::Template => 3,
        }
    }
}

/// Pending cleanup action, keyed by token in the owner's queue document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedDeletion {
    ShareToken {
        token: ShareToken,
        kind: ShareKind,
        ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl QueuedDeletion {
    pub fn team_share_token(token: &ShareToken, ids: &[String]) -> Self {
        Self::share_token(token, ShareKind::Team, ids)
    }

    pub fn template_share_token(token: &ShareToken, ids: &[String]) -> Self {
        Self::share_token(token, ShareKind::Template, ids)
    }

    fn share_token(token: &ShareToken, kind: ShareKind, ids: &[String]) -> Self {
        QueuedDeletion::ShareToken {
            token: token.clone(),
            kind,
            ids: ids.to_vec(),
            timestamp: Utc::now(),
        }
    }

    /// Stamp the entry with the time the share was issued
    pub fn at(self, at: DateTime<Utc>) -> Self {
        match self {
            QueuedDeletion::ShareToken {
                token, kind, ids, ..
            } => QueuedDeletion::ShareToken {
                token,
                kind,
                ids,
                timestamp: at,
            },
        }
    }

    /// Document fragment merged into the deletion queue
    pub fn data(&self) -> Value {
        match self {
            QueuedDeletion::ShareToken {
                token,
                kind,
                ids,
                timestamp,
            } => {
                let ids: Map<String, Value> = ids
                    .iter()
                    .map(|id| (id.clone(), Value::Bool(true)))
                    .collect();

                let mut entry = Map::new();
                entry.insert(FIELD_TYPE.to_string(), Value::from(kind.code()));
                entry.insert(FIELD_TIMESTAMP.to_string(), Value::String(timestamp.to_rfc3339()));
                entry.insert(FIELD_IDS.to_string(), Value::Object(ids));

                let mut data = Map::new();
                data.insert(token.to_string(), Value::Object(entry));
                Value::Object(data)
            }
        }
    }
}
