//! input-sync-core: keep an editable text buffer in sync with a field of a
//! shared document.
//!
//! This crate provides:
//! - Single-edit diffing of before/after strings into text operations
//! - Caret/selection transforms through applied operations
//! - Reconciliation of incoming op batches (incremental vs. disruptive reset)
//! - `InputSync`, the engine tying both edges together with echo suppression
//! - `SharedDocument` and `TextBuffer` trait abstractions, with in-memory
//!   implementations

pub mod batch;
pub mod buffer;
pub mod config;
pub mod diff;
pub mod document;
pub mod engine;
pub mod events;
pub mod op;
pub mod reconcile;
pub mod source;
pub mod transform;

pub use batch::{FieldOp, OpBatch, PathSegment, TEXT_SUBTYPE};
pub use buffer::{InMemoryBuffer, TextBuffer};
pub use config::{ConfigError, SyncOptions};
pub use diff::{diff, normalize_newlines};
pub use document::{DocumentError, InMemoryDocument, SharedDocument};
pub use engine::{BatchOutcome, InputSync, SyncError};
pub use events::{OpBus, Subscription};
pub use op::{OpComponent, OpError, Operation};
pub use reconcile::{Reconciliation, reconcile};
pub use source::SourceMarker;
pub use transform::{Selection, transform_index, transform_selection};
