/// Document Store
///
/// JSON documents addressed by `collection/id`, written through atomic
/// batches. Supports multiple backend implementations (SQLite for now).

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

use crate::{
    error::ShareResult,
    model::{DocumentRef, FieldPath},
};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;

/// Length of generated document ids
pub const AUTO_ID_LENGTH: usize = 20;

/// Document store backend trait
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Generate a globally unique document id without writing anything
    fn generate_id(&self) -> String {
        auto_id()
    }

    /// Apply every operation of the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> ShareResult<()>;

    /// Fetch a document
    async fn get(&self, reference: &DocumentRef) -> ShareResult<Option<Value>>;
}

/// Random alphanumeric id in the same shape as store generated keys
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// A single write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Fail the batch unless the document exists and has `field` set
    Require {
        reference: DocumentRef,
        field: FieldPath,
    },
    /// Set one field of an existing document
    Update {
        reference: DocumentRef,
        field: FieldPath,
        value: Value,
    },
    /// Deep-merge `data` into a document, creating it if needed
    SetMerge { reference: DocumentRef, data: Value },
}

/// Ordered group of writes committed atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, reference: DocumentRef, field: FieldPath) -> &mut Self {
        self.ops.push(WriteOp::Require { reference, field });
        self
    }

    pub fn update(&mut self, reference: DocumentRef, field: FieldPath, value: Value) -> &mut Self {
        self.ops.push(WriteOp::Update {
            reference,
            field,
            value,
        });
        self
    }

    pub fn set_merge(&mut self, reference: DocumentRef, data: Value) -> &mut Self {
        self.ops.push(WriteOp::SetMerge { reference, data });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Whether `field` is present and non-null inside `document`
pub(crate) fn has_field(document: &Value, field: &FieldPath) -> bool {
    let mut current = document;
    for segment in field.segments() {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    !current.is_null()
}

/// Set `value` at `field` inside `document`, creating intermediate maps
pub(crate) fn set_field(document: &mut Value, field: &FieldPath, value: Value) -> Result<(), String> {
    let segments = field.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Err("Field path cannot be empty".to_string());
    };

    let mut current = document;
    for segment in parents {
        let map = current
            .as_object_mut()
            .ok_or_else(|| format!("Field {} is not a map", segment))?;
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Default::default()));
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
    }

    let map = current
        .as_object_mut()
        .ok_or_else(|| format!("Cannot set {} on a non-map value", field))?;
    map.insert(last.clone(), value);
    Ok(())
}

/// Recursively merge `patch` into `target`; maps merge, everything else replaces
pub(crate) fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                let both_maps = value.is_object() && target.get(&key).is_some_and(Value::is_object);
                if !both_maps {
                    target.insert(key, value);
                } else if let Some(existing) = target.get_mut(&key) {
                    merge(existing, value);
                }
            }
        }
        (target, patch) => *target = patch,
    }
}
