//! Text operations: ordered retain/insert/delete components.
//!
//! An [`Operation`] walks a source string left to right. `Retain(n)` copies
//! `n` characters, `Delete(n)` skips `n` characters, `Insert(s)` splices `s`
//! in. Anything left in the source after the last component is retained.
//!
//! Counts are in `char`s (Unicode scalar values), never bytes.
//!
//! # Wire format
//!
//! Operations serialize to the ot-text JSON form:
//! a number is a retain, a string is an insert, `{"d": n}` is a delete.
//!
//! ```
//! use input_sync_core::op::Operation;
//!
//! let op: Operation = serde_json::from_str(r#"[3, {"d": 1}, "abc"]"#).unwrap();
//! assert_eq!(op.apply("foo!bar").unwrap(), "fooabcbar");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("Retain of {count} at {position} runs past end of {len}-char string")]
    RetainOutOfBounds {
        position: usize,
        count: usize,
        len: usize,
    },

    #[error("Delete of {count} at {position} runs past end of {len}-char string")]
    DeleteOutOfBounds {
        position: usize,
        count: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, OpError>;

/// One part of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireComponent", into = "WireComponent")]
pub enum OpComponent {
    /// Skip `n` characters unchanged.
    Retain(usize),
    /// Insert literal text.
    Insert(String),
    /// Remove `n` characters from the source.
    Delete(usize),
}

impl OpComponent {
    /// Characters consumed from the source string.
    pub fn source_len(&self) -> usize {
        match self {
            OpComponent::Retain(n) | OpComponent::Delete(n) => *n,
            OpComponent::Insert(_) => 0,
        }
    }

    /// Characters produced in the target string.
    pub fn target_len(&self) -> usize {
        match self {
            OpComponent::Retain(n) => *n,
            OpComponent::Insert(s) => s.chars().count(),
            OpComponent::Delete(_) => 0,
        }
    }

    fn is_noop(&self) -> bool {
        match self {
            OpComponent::Retain(n) | OpComponent::Delete(n) => *n == 0,
            OpComponent::Insert(s) => s.is_empty(),
        }
    }
}

/// Untagged shape used on the wire.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireComponent {
    Retain(usize),
    Insert(String),
    Delete { d: usize },
}

impl TryFrom<WireComponent> for OpComponent {
    type Error = String;

    fn try_from(wire: WireComponent) -> std::result::Result<Self, Self::Error> {
        let component = match wire {
            WireComponent::Retain(n) => OpComponent::Retain(n),
            WireComponent::Insert(s) => OpComponent::Insert(s),
            WireComponent::Delete { d } => OpComponent::Delete(d),
        };
        if component.is_noop() {
            return Err(format!("zero-length component: {:?}", component));
        }
        Ok(component)
    }
}

impl From<OpComponent> for WireComponent {
    fn from(component: OpComponent) -> Self {
        match component {
            OpComponent::Retain(n) => WireComponent::Retain(n),
            OpComponent::Insert(s) => WireComponent::Insert(s),
            OpComponent::Delete(d) => WireComponent::Delete { d },
        }
    }
}

/// An ordered sequence of [`OpComponent`]s.
///
/// The empty operation means "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operation(Vec<OpComponent>);

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a retain (skipped when `n == 0`).
    pub fn retain(mut self, n: usize) -> Self {
        self.push(OpComponent::Retain(n));
        self
    }

    /// Builder: append an insert (skipped when `text` is empty).
    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.push(OpComponent::Insert(text.into()));
        self
    }

    /// Builder: append a delete (skipped when `n == 0`).
    pub fn delete(mut self, n: usize) -> Self {
        self.push(OpComponent::Delete(n));
        self
    }

    /// Append a component, merging it into a trailing component of the same
    /// kind. Zero-length components are dropped.
    pub fn push(&mut self, component: OpComponent) {
        if component.is_noop() {
            return;
        }
        match (self.0.last_mut(), &component) {
            (Some(OpComponent::Retain(n)), OpComponent::Retain(m)) => {
                *n += m;
                return;
            }
            (Some(OpComponent::Delete(n)), OpComponent::Delete(m)) => {
                *n += m;
                return;
            }
            (Some(OpComponent::Insert(s)), OpComponent::Insert(t)) => {
                s.push_str(t);
                return;
            }
            _ => {}
        }
        self.0.push(component);
    }

    /// Append every component of `other` as-is, without merging.
    pub fn append(&mut self, other: Operation) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn components(&self) -> &[OpComponent] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OpComponent> {
        self.0.iter()
    }

    /// Characters the explicit components consume from the source.
    pub fn source_len(&self) -> usize {
        self.0.iter().map(OpComponent::source_len).sum()
    }

    /// Characters the explicit components produce.
    pub fn target_len(&self) -> usize {
        self.0.iter().map(OpComponent::target_len).sum()
    }

    /// Apply this operation to `source`.
    pub fn apply(&self, source: &str) -> Result<String> {
        let chars: Vec<char> = source.chars().collect();
        let mut result = String::with_capacity(source.len());
        let mut position = 0usize;

        for component in &self.0 {
            match component {
                OpComponent::Retain(n) => {
                    let end = position + n;
                    if end > chars.len() {
                        return Err(OpError::RetainOutOfBounds {
                            position,
                            count: *n,
                            len: chars.len(),
                        });
                    }
                    result.extend(&chars[position..end]);
                    position = end;
                }
                OpComponent::Delete(n) => {
                    let end = position + n;
                    if end > chars.len() {
                        return Err(OpError::DeleteOutOfBounds {
                            position,
                            count: *n,
                            len: chars.len(),
                        });
                    }
                    position = end;
                }
                OpComponent::Insert(s) => result.push_str(s),
            }
        }

        result.extend(&chars[position..]);
        Ok(result)
    }
}

impl From<Vec<OpComponent>> for Operation {
    /// Keeps the components as given; use [`Operation::push`] to compact.
    fn from(components: Vec<OpComponent>) -> Self {
        Self(components)
    }
}

impl FromIterator<OpComponent> for Operation {
    fn from_iter<I: IntoIterator<Item = OpComponent>>(iter: I) -> Self {
        let mut op = Operation::new();
        for component in iter {
            op.push(component);
        }
        op
    }
}

impl IntoIterator for Operation {
    type Item = OpComponent;
    type IntoIter = std::vec::IntoIter<OpComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Operation {
    type Item = &'a OpComponent;
    type IntoIter = std::slice::Iter<'a, OpComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
