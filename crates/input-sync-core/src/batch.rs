//! Path-scoped operations as delivered by the shared document.
//!
//! A [`FieldOp`] serializes as `{"p": [...], "t": "text", "o": [...]}`, the
//! json0 shape with an embedded ot-text subtype operation.

use crate::op::Operation;
use crate::source::SourceMarker;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subtype identifier of plain text operations.
pub const TEXT_SUBTYPE: &str = "text";

/// One segment of a document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    pub fn is_key(&self, key: &str) -> bool {
        matches!(self, PathSegment::Key(k) if k == key)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

/// A single mutation of the shared document.
///
/// Only text-subtype ops carry `parts`. For anything else (a whole-field
/// replace, a nested edit, another subtype) the operand is not parsed and
/// `parts` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireFieldOp")]
pub struct FieldOp {
    #[serde(rename = "p", default)]
    pub path: Vec<PathSegment>,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(rename = "o", default, skip_serializing_if = "Operation::is_empty")]
    pub parts: Operation,
}

#[derive(Deserialize)]
struct WireFieldOp {
    #[serde(default)]
    p: Vec<PathSegment>,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    o: Option<serde_json::Value>,
}

impl TryFrom<WireFieldOp> for FieldOp {
    type Error = serde_json::Error;

    fn try_from(wire: WireFieldOp) -> Result<Self, Self::Error> {
        let parts = match (wire.t.as_deref(), wire.o) {
            (Some(TEXT_SUBTYPE), Some(o)) => serde_json::from_value(o)?,
            _ => Operation::new(),
        };
        Ok(Self {
            path: wire.p,
            subtype: wire.t,
            parts,
        })
    }
}

impl FieldOp {
    /// A text-subtype op on the top-level field `key`.
    pub fn text(key: &str, parts: Operation) -> Self {
        Self {
            path: vec![PathSegment::from(key)],
            subtype: Some(TEXT_SUBTYPE.to_string()),
            parts,
        }
    }

    /// A non-text op replacing the whole top-level field `key`.
    pub fn replace(key: &str) -> Self {
        Self {
            path: vec![PathSegment::from(key)],
            subtype: None,
            parts: Operation::new(),
        }
    }

    /// Whether the op's path starts at the top-level field `key`.
    pub fn touches(&self, key: &str) -> bool {
        self.path.first().is_some_and(|segment| segment.is_key(key))
    }

    /// Whether this is a text-subtype op addressed exactly to `key`.
    pub fn is_text_on(&self, key: &str) -> bool {
        self.path.len() == 1 && self.touches(key) && self.subtype.as_deref() == Some(TEXT_SUBTYPE)
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(
            f,
            "[{}] {} {}",
            path.join("/"),
            self.subtype.as_deref().unwrap_or("-"),
            self.parts
        )
    }
}

/// An ordered batch of ops with the marker it was submitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpBatch {
    pub ops: Vec<FieldOp>,
    pub source: SourceMarker,
}

impl OpBatch {
    pub fn new(ops: Vec<FieldOp>, source: SourceMarker) -> Self {
        Self { ops, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_op_is_on_field() {
        let op = FieldOp::text("valueA", Operation::new().insert("x"));
        assert!(op.touches("valueA"));
        assert!(op.is_text_on("valueA"));
        assert!(!op.is_text_on("valueB"));
    }

    #[test]
    fn test_replace_touches_but_is_not_text() {
        let op = FieldOp::replace("valueA");
        assert!(op.touches("valueA"));
        assert!(!op.is_text_on("valueA"));
    }

    #[test]
    fn test_nested_path_is_not_text_on_field() {
        let op = FieldOp {
            path: vec!["valueA".into(), 0.into()],
            subtype: Some(TEXT_SUBTYPE.into()),
            parts: Operation::new().insert("x"),
        };
        assert!(op.touches("valueA"));
        assert!(!op.is_text_on("valueA"));
    }

    #[test]
    fn test_empty_path_touches_nothing() {
        let op = FieldOp {
            path: vec![],
            subtype: Some(TEXT_SUBTYPE.into()),
            parts: Operation::new().insert("x"),
        };
        assert!(!op.touches("valueA"));
        assert!(!op.is_text_on("valueA"));
    }

    #[test]
    fn test_index_segment_never_matches_key() {
        let op = FieldOp {
            path: vec![3.into()],
            subtype: Some(TEXT_SUBTYPE.into()),
            parts: Operation::new().insert("x"),
        };
        assert!(!op.touches("3"));
    }

    #[test]
    fn test_wire_format() {
        let op = FieldOp::text("valueA", Operation::new().retain(3).insert("XYZ"));
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"p":["valueA"],"t":"text","o":[3,"XYZ"]}"#);

        let parsed: FieldOp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn test_wire_other_subtype_is_not_parsed() {
        let ops: Vec<FieldOp> = serde_json::from_str(
            r#"[
                {"p": ["valueA"], "t": "text0", "o": [{"p": 0, "i": "x"}]},
                {"p": ["valueA"], "t": "text", "o": [1, "y"]}
            ]"#,
        )
        .unwrap();

        assert_eq!(ops[0].subtype.as_deref(), Some("text0"));
        assert!(ops[0].parts.is_empty());
        assert!(ops[0].touches("valueA"));
        assert!(!ops[0].is_text_on("valueA"));
        assert_eq!(ops[1], FieldOp::text("valueA", Operation::new().retain(1).insert("y")));
    }

    #[test]
    fn test_wire_bad_text_operand_is_an_error() {
        assert!(serde_json::from_str::<FieldOp>(r#"{"p": ["valueA"], "t": "text", "o": [true]}"#).is_err());
        assert!(serde_json::from_str::<FieldOp>(r#"{"p": ["valueA"], "t": "text", "o": {"d": 1}}"#).is_err());
    }

    #[test]
    fn test_wire_missing_fields_default() {
        let parsed: FieldOp = serde_json::from_str(r#"{"oi": "whole new value"}"#).unwrap();
        assert!(parsed.path.is_empty());
        assert!(parsed.subtype.is_none());
        assert!(parsed.parts.is_empty());

        let parsed: FieldOp = serde_json::from_str(r#"{"p": ["valueA", 2], "od": "x"}"#).unwrap();
        assert_eq!(parsed.path, vec![PathSegment::from("valueA"), PathSegment::Index(2)]);
    }
}
