//! Map caret offsets through an applied [`Operation`].

use crate::op::{OpComponent, Operation};
use serde::{Deserialize, Serialize};

/// Map `index` in the pre-operation string to the matching offset in the
/// post-operation string.
///
/// Inserts at or before the index push it forward by the inserted length, so
/// a caret sitting exactly where text is inserted ends up after it. An index
/// inside a deleted span collapses to the start of the span.
///
/// ```
/// use input_sync_core::op::Operation;
/// use input_sync_core::transform::transform_index;
///
/// assert_eq!(transform_index(6, &Operation::new().retain(6).insert("X")), 7);
/// assert_eq!(transform_index(8, &Operation::new().retain(5).delete(3)), 5);
/// ```
pub fn transform_index(mut index: usize, op: &Operation) -> usize {
    let mut op_position = 0usize;

    for component in op {
        match component {
            OpComponent::Retain(n) => op_position += n,
            OpComponent::Insert(s) => {
                let len = s.chars().count();
                op_position += len;
                index += len;
            }
            OpComponent::Delete(n) => {
                index = index.saturating_sub(*n).max(op_position);
            }
        }

        if op_position > index {
            break;
        }
    }

    index
}

/// A caret or selection range in a text buffer, as char offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A collapsed selection.
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Transform both endpoints of a selection.
pub fn transform_selection(selection: Selection, op: &Operation) -> Selection {
    Selection {
        start: transform_index(selection.start, op),
        end: transform_index(selection.end, op),
    }
}
