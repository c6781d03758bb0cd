//! SharedDocument trait for the replicated document service.
//!
//! Implementations:
//! - `InMemoryDocument` - For testing and the REPL host
//!
//! The service owns persistence, transport and conflict resolution. The
//! engine only reads the authoritative value of its field, submits
//! path-scoped ops tagged with a source marker, and listens for applied
//! batches.

use crate::batch::{FieldOp, OpBatch};
use crate::events::{OpBus, Subscription};
use crate::op::OpError;
use crate::source::SourceMarker;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported op: {0}")]
    Unsupported(String),

    #[error("Failed to apply op to field {key}: {source}")]
    Apply {
        key: String,
        #[source]
        source: OpError,
    },

    #[error("Submit rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// A document whose string fields are replicated across sources.
pub trait SharedDocument: Send + Sync {
    /// Authoritative value of the top-level field `key`, if set.
    fn field_value(&self, key: &str) -> Option<String>;

    /// Apply `ops` and broadcast them, tagged with `source`.
    fn submit(&self, ops: Vec<FieldOp>, source: &SourceMarker) -> Result<()>;

    /// Listen for applied batches. Drop the handle to stop listening.
    fn subscribe(&self, listener: Box<dyn Fn(&OpBatch) + Send + Sync>) -> Subscription;
}

/// In-memory document with string fields.
///
/// Batches are delivered synchronously from inside `submit`, after the
/// fields have been updated, in submission order.
pub struct InMemoryDocument {
    fields: RwLock<HashMap<String, String>>,
    bus: Arc<OpBus>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self {
            fields: RwLock::new(HashMap::new()),
            bus: Arc::new(OpBus::new()),
        }
    }

    /// Create a document with the given initial fields.
    pub fn with_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let doc = Self::new();
        {
            let mut map = doc.fields.write().unwrap_or_else(|e| e.into_inner());
            for (key, value) in fields {
                map.insert(key.to_string(), value.to_string());
            }
        }
        doc
    }

    /// Replace the whole field `key` and broadcast a non-text op.
    pub fn replace_field(&self, key: &str, value: &str, source: &SourceMarker) {
        self.fields
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        debug!("Replaced field {} from {}", key, source);
        self.broadcast(&OpBatch::new(vec![FieldOp::replace(key)], source.clone()));
    }

    /// Deliver a batch to listeners without applying it.
    pub fn broadcast(&self, batch: &OpBatch) {
        let delivered = self.bus.emit(batch);
        debug!("Delivered batch from {} to {} listener(s)", batch.source, delivered);
    }

    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Compute every field change first so a rejected batch leaves the
    /// document untouched.
    fn apply_ops(&self, ops: &[FieldOp]) -> Result<()> {
        let mut fields = self.fields.write().unwrap_or_else(|e| e.into_inner());
        let mut staged: HashMap<String, String> = HashMap::new();

        for op in ops {
            let key = match op.path.as_slice() {
                [crate::batch::PathSegment::Key(key)] if op.is_text_on(key) => key,
                _ => return Err(DocumentError::Unsupported(op.to_string())),
            };
            let current = staged
                .get(key)
                .or_else(|| fields.get(key))
                .map(String::as_str)
                .unwrap_or("");
            let next = op.parts.apply(current).map_err(|source| DocumentError::Apply {
                key: key.clone(),
                source,
            })?;
            staged.insert(key.clone(), next);
        }

        fields.extend(staged);
        Ok(())
    }
}

impl Default for InMemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedDocument for InMemoryDocument {
    fn field_value(&self, key: &str) -> Option<String> {
        self.fields
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn submit(&self, ops: Vec<FieldOp>, source: &SourceMarker) -> Result<()> {
        self.apply_ops(&ops)?;
        debug!("Applied {} op(s) from {}", ops.len(), source);
        // The write lock is released; listeners may read fields back.
        self.broadcast(&OpBatch::new(ops, source.clone()));
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&OpBatch) + Send + Sync>) -> Subscription {
        self.bus.subscribe(listener)
    }
}
