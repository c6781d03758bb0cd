//! Decide how an incoming batch lands on the bound field.
//!
//! Text-subtype ops addressed exactly to the field are concatenated into one
//! composite operation, which only drives the caret transform: the buffer's
//! new content always comes from the authoritative document value.
//!
//! Any other op that touches the field (a whole-field replace, an edit below
//! it) can't be mapped onto the caret. If it left the authoritative value
//! different from the buffer, the buffer is reset wholesale.

use crate::batch::FieldOp;
use crate::op::Operation;
use tracing::debug;

/// Outcome of reconciling one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Replace the buffer with `value`; the caret is not preserved.
    Reset { value: String },
    /// Replace the buffer with `value` and move the caret through `op`.
    Incremental { value: String, op: Operation },
}

impl Reconciliation {
    pub fn value(&self) -> &str {
        match self {
            Reconciliation::Reset { value } | Reconciliation::Incremental { value, .. } => value,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Reconciliation::Reset { .. })
    }
}

/// Classify `ops` against the field `key`.
///
/// `authoritative` is the document's field value after the batch was applied;
/// `buffer_value` is what the buffer currently shows.
pub fn reconcile(key: &str, ops: &[FieldOp], authoritative: &str, buffer_value: &str) -> Reconciliation {
    let untracked = ops.iter().any(|op| op.touches(key) && !op.is_text_on(key));

    if untracked && authoritative != buffer_value {
        debug!("Field {} changed by an untracked op; resetting", key);
        return Reconciliation::Reset {
            value: authoritative.to_string(),
        };
    }

    Reconciliation::Incremental {
        value: authoritative.to_string(),
        op: combine_text_ops(key, ops),
    }
}

/// Concatenate, in batch order, the parts of every text op on `key`.
pub fn combine_text_ops(key: &str, ops: &[FieldOp]) -> Operation {
    let mut combined = Operation::new();
    for op in ops {
        if !op.is_text_on(key) {
            debug!("Skipping op not on field {}: {}", key, op);
            continue;
        }
        debug!("Received op on field {}: {}", key, op);
        combined.append(op.parts.clone());
    }
    combined
}
