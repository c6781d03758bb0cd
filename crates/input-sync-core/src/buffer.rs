//! TextBuffer trait abstraction for the locally editable widget.
//!
//! Implementations:
//! - `InMemoryBuffer` - For testing and headless hosts
//!
//! Methods take `&self`: the widget owns its state and the engine reaches it
//! from inside a subscription callback. Offsets are char offsets.

use crate::transform::Selection;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The editable widget a field is bound to.
pub trait TextBuffer: Send + Sync {
    /// Raw current value, line endings as the widget reports them.
    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    fn selection(&self) -> Selection;

    fn set_selection(&self, selection: Selection);

    fn scroll_offset(&self) -> f64;

    fn set_scroll_offset(&self, offset: f64);

    /// Whether the widget currently holds input focus.
    fn has_focus(&self) -> bool;
}

/// In-memory buffer for testing
pub struct InMemoryBuffer {
    value: RwLock<String>,
    selection: RwLock<Selection>,
    scroll: RwLock<f64>,
    focused: AtomicBool,
    /// Number of `set_value` calls, so tests can tell "untouched" from
    /// "rewritten with the same text".
    writes: AtomicUsize,
}

impl InMemoryBuffer {
    pub fn new(value: &str) -> Self {
        Self {
            value: RwLock::new(value.to_string()),
            selection: RwLock::new(Selection::default()),
            scroll: RwLock::new(0.0),
            focused: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_focus(&self, focused: bool) {
        self.focused.store(focused, Ordering::Relaxed);
    }

    /// Simulate the user typing: replace the value without counting it as a
    /// programmatic write, and put the caret at the end.
    pub fn type_text(&self, value: &str) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = value.to_string();
        self.set_selection(Selection::caret(value.chars().count()));
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn len(&self) -> usize {
        self.value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .chars()
            .count()
    }
}

impl Default for InMemoryBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer for InMemoryBuffer {
    fn value(&self) -> String {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = value.to_string();
        self.writes.fetch_add(1, Ordering::Relaxed);

        // Like a real input element, keep the selection inside the new text.
        let len = value.chars().count();
        let mut selection = self.selection.write().unwrap_or_else(|e| e.into_inner());
        selection.start = selection.start.min(len);
        selection.end = selection.end.min(len);
    }

    fn selection(&self) -> Selection {
        *self.selection.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_selection(&self, selection: Selection) {
        let len = self.len();
        let start = selection.start.min(len);
        let end = selection.end.min(len).max(start);
        *self.selection.write().unwrap_or_else(|e| e.into_inner()) = Selection { start, end };
    }

    fn scroll_offset(&self) -> f64 {
        *self.scroll.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_scroll_offset(&self, offset: f64) {
        *self.scroll.write().unwrap_or_else(|e| e.into_inner()) = offset;
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_counts_writes() {
        let buffer = InMemoryBuffer::new("foo");
        assert_eq!(buffer.write_count(), 0);

        buffer.set_value("bar");

        assert_eq!(buffer.value(), "bar");
        assert_eq!(buffer.write_count(), 1);
    }

    #[test]
    fn test_type_text_is_not_a_programmatic_write() {
        let buffer = InMemoryBuffer::new("");
        buffer.type_text("héllo");
        assert_eq!(buffer.value(), "héllo");
        assert_eq!(buffer.selection(), Selection::caret(5));
        assert_eq!(buffer.write_count(), 0);
    }

    #[test]
    fn test_selection_clamped_to_value() {
        let buffer = InMemoryBuffer::new("abc");
        buffer.set_selection(Selection::new(1, 10));
        assert_eq!(buffer.selection(), Selection::new(1, 3));

        buffer.set_value("a");
        assert_eq!(buffer.selection(), Selection::new(1, 1));
    }

    #[test]
    fn test_focus_and_scroll() {
        let buffer = InMemoryBuffer::default();
        assert!(!buffer.has_focus());
        buffer.set_focus(true);
        assert!(buffer.has_focus());

        buffer.set_scroll_offset(12.5);
        assert_eq!(buffer.scroll_offset(), 12.5);
    }
}
