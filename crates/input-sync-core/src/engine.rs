//! InputSync: keeps one buffer and one document field in step.
//!
//! Two edges drive the engine, both run to completion:
//!
//! 1. **Outbound** (`handle_change`): the host calls it whenever the buffer
//!    value may have changed. Line-ending-only changes are ignored; anything
//!    else is diffed against the last value it knows both sides agree on and
//!    submitted as a text op, tagged with its own source marker.
//! 2. **Inbound**: the document delivers every applied batch to the
//!    subscription taken in `start`. Batches carrying our own marker are
//!    echoes and are skipped. Everything else goes through the reconciler,
//!    then the buffer takes the authoritative value and the caret is moved
//!    through the batch's text parts.
//!
//! `last_value` is always updated before the engine calls out to the
//! document or the buffer, so a re-entrant call never diffs against a stale
//! baseline.

use crate::batch::{FieldOp, OpBatch};
use crate::buffer::TextBuffer;
use crate::config::SyncOptions;
use crate::diff::{diff, normalize_newlines};
use crate::document::{DocumentError, SharedDocument};
use crate::events::Subscription;
use crate::op::Operation;
use crate::reconcile::{Reconciliation, reconcile};
use crate::source::SourceMarker;
use crate::transform::transform_selection;

use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to submit op: {0}")]
    Submit(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// What the inbound edge did with a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch carried our own marker.
    Echo,
    /// The engine was stopped.
    Stopped,
    /// The buffer was overwritten; the caret was not preserved.
    Reset,
    /// The buffer took the authoritative value and the caret followed `op`.
    Applied { op: Operation },
}

struct SyncState {
    last_value: String,
    started: bool,
}

struct Inner<D: ?Sized, B: ?Sized> {
    doc: Arc<D>,
    buffer: Arc<B>,
    key: String,
    source: SourceMarker,
    state: Mutex<SyncState>,
}

impl<D, B> Inner<D, B>
where
    D: SharedDocument + ?Sized,
    B: TextBuffer + ?Sized,
{
    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn doc_value(&self) -> String {
        self.doc.field_value(&self.key).unwrap_or_default()
    }

    fn handle_batch(&self, batch: &OpBatch) -> BatchOutcome {
        if batch.source == self.source {
            debug!("Skipping local op on field {} ({} op(s))", self.key, batch.ops.len());
            return BatchOutcome::Echo;
        }

        let reconciliation = {
            let mut state = self.lock_state();
            if !state.started {
                debug!("Ignoring batch on field {} while stopped", self.key);
                return BatchOutcome::Stopped;
            }

            let authoritative = self.doc_value();
            let buffer_value = self.buffer.value();
            let reconciliation = reconcile(&self.key, &batch.ops, &authoritative, &buffer_value);
            state.last_value = reconciliation.value().to_string();
            reconciliation
        };

        match reconciliation {
            Reconciliation::Reset { value } => {
                info!(
                    "Field {} changed by an untracked op from {}; resetting buffer",
                    self.key, batch.source
                );
                self.set_value_disruptively(&value);
                BatchOutcome::Reset
            }
            Reconciliation::Incremental { value, op } => {
                debug!("Applying {} from {} to field {}", op, batch.source, self.key);
                self.set_value_after_text_op(&value, &op);
                BatchOutcome::Applied { op }
            }
        }
    }

    fn set_value_after_text_op(&self, value: &str, op: &Operation) {
        let scroll = self.buffer.scroll_offset();
        let selection = self.buffer.selection();

        self.buffer.set_value(value);

        if self.buffer.scroll_offset() != scroll {
            self.buffer.set_scroll_offset(scroll);
        }

        if self.buffer.has_focus() {
            self.buffer.set_selection(transform_selection(selection, op));
        }
    }

    fn set_value_disruptively(&self, value: &str) {
        self.buffer.set_value(value);
    }
}

/// Binds one document field to one text buffer.
///
/// Created stopped. `start` pulls the document value into the buffer and
/// subscribes to the document; `stop` drops the subscription. Outbound
/// changes are only sent while started.
pub struct InputSync<D: ?Sized, B: ?Sized> {
    inner: Arc<Inner<D, B>>,
    subscription: Option<Subscription>,
}

impl<D, B> InputSync<D, B>
where
    D: SharedDocument + ?Sized + 'static,
    B: TextBuffer + ?Sized + 'static,
{
    pub fn new(doc: Arc<D>, buffer: Arc<B>, options: SyncOptions) -> Self {
        let source = options.source.unwrap_or_else(SourceMarker::generate);
        let last_value = normalize_newlines(&buffer.value()).into_owned();
        Self {
            inner: Arc::new(Inner {
                doc,
                buffer,
                key: options.key,
                source,
                state: Mutex::new(SyncState {
                    last_value,
                    started: false,
                }),
            }),
            subscription: None,
        }
    }

    /// Pull the document value into the buffer and start listening.
    ///
    /// Returns `false` if already started.
    pub fn start(&mut self) -> bool {
        if self.subscription.is_some() {
            return false;
        }

        let value = self.inner.doc_value();
        {
            let mut state = self.inner.lock_state();
            state.last_value = value.clone();
            state.started = true;
        }
        self.inner.buffer.set_value(&value);

        let weak = Arc::downgrade(&self.inner);
        self.subscription = Some(self.inner.doc.subscribe(Box::new(move |batch: &OpBatch| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_batch(batch);
            }
        })));

        info!("Started sync on field {} as {}", self.inner.key, self.inner.source);
        true
    }

    /// Stop listening for remote batches.
    ///
    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let Some(subscription) = self.subscription.take() else {
            return false;
        };
        drop(subscription);
        self.inner.lock_state().started = false;
        info!("Stopped sync on field {}", self.inner.key);
        true
    }

    /// Diff the buffer against the last known value and submit the change.
    ///
    /// Returns the submitted op, or `None` when stopped or nothing changed.
    /// A rejected submit is returned as an error and not retried; the new
    /// value is kept as the baseline either way.
    pub fn handle_change(&self) -> Result<Option<Operation>> {
        let op = {
            let mut state = self.inner.lock_state();
            if !state.started {
                debug!("Ignoring change on field {} while not started", self.inner.key);
                return Ok(None);
            }

            let raw = self.inner.buffer.value();
            let new_value = normalize_newlines(&raw);
            if normalize_newlines(&state.last_value) == new_value {
                debug!("Change on field {} but no change in value", self.inner.key);
                return Ok(None);
            }

            // Offsets must line up with the document, which may still hold
            // `\r\n`; diffing the raw baseline rewrites it to `\n`.
            let op = diff(&state.last_value, &new_value);

            state.last_value = new_value.into_owned();
            op
        };

        debug!("Produced op {} on field {}", op, self.inner.key);
        let field_op = FieldOp::text(&self.inner.key, op.clone());
        if let Err(e) = self.inner.doc.submit(vec![field_op], &self.inner.source) {
            warn!("Submit on field {} failed: {}", self.inner.key, e);
            return Err(e.into());
        }
        Ok(Some(op))
    }

    /// Run the inbound edge on `batch` directly.
    ///
    /// The subscription taken by `start` calls this for every batch the
    /// document delivers; hosts that route batches themselves can call it
    /// instead.
    pub fn handle_batch(&self, batch: &OpBatch) -> BatchOutcome {
        self.inner.handle_batch(batch)
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock_state().started
    }

    /// The value both sides are believed to agree on.
    pub fn last_value(&self) -> String {
        self.inner.lock_state().last_value.clone()
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn source(&self) -> &SourceMarker {
        &self.inner.source
    }

    pub fn document(&self) -> &Arc<D> {
        &self.inner.doc
    }

    pub fn buffer(&self) -> &Arc<B> {
        &self.inner.buffer
    }
}
