//! A REPL session: one in-memory document with one or more fields, each
//! bound to its own buffer and engine.

use crate::command::{Command, HELP};
use input_sync_core::{
    InMemoryBuffer, InMemoryDocument, InputSync, Selection, SharedDocument, SourceMarker,
    SyncOptions, TextBuffer,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Marker for everything the session submits on behalf of "other clients".
pub const REMOTE_SOURCE: &str = "repl-remote";

type Binding = InputSync<InMemoryDocument, InMemoryBuffer>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No field to bind")]
    NoBindings,

    #[error("Field {0} is bound twice")]
    DuplicateKey(String),
}

/// What the host should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Print this text.
    Output(String),
    /// Nothing to print.
    Quiet,
    /// Exit the loop.
    Quit,
}

pub struct Session {
    doc: Arc<InMemoryDocument>,
    bindings: Vec<Binding>,
    current: usize,
    remote: SourceMarker,
}

impl Session {
    /// Create a document with every bound field set to `initial`, bind each
    /// field to a fresh buffer and start syncing. The first field becomes
    /// the current one.
    pub fn new(options: Vec<SyncOptions>, initial: &str) -> Result<Self, SessionError> {
        if options.is_empty() {
            return Err(SessionError::NoBindings);
        }
        for (i, option) in options.iter().enumerate() {
            if options[..i].iter().any(|o| o.key == option.key) {
                return Err(SessionError::DuplicateKey(option.key.clone()));
            }
        }

        let doc = Arc::new(InMemoryDocument::with_fields(
            options.iter().map(|o| (o.key.as_str(), initial)),
        ));
        let bindings = options
            .into_iter()
            .map(|options| {
                let buffer = Arc::new(InMemoryBuffer::new(""));
                let mut sync = InputSync::new(Arc::clone(&doc), buffer, options);
                sync.start();
                sync
            })
            .collect();

        Ok(Self {
            doc,
            bindings,
            current: 0,
            remote: SourceMarker::from(REMOTE_SOURCE),
        })
    }

    /// The binding commands currently act on.
    pub fn sync(&self) -> &Binding {
        &self.bindings[self.current]
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The binding for `key`, if bound.
    pub fn binding(&self, key: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.key() == key)
    }

    pub fn execute(&mut self, command: Command) -> Reply {
        let buffer = Arc::clone(self.sync().buffer());
        match command {
            Command::Type(text) => {
                buffer.type_text(&text);
                match self.sync().handle_change() {
                    Ok(Some(op)) => Reply::Output(format!("sent {}", op)),
                    Ok(None) => Reply::Output("no change sent".to_string()),
                    Err(e) => {
                        warn!("{}", e);
                        Reply::Output(format!("error: {}", e))
                    }
                }
            }
            Command::Remote(ops) => match self.doc.submit(ops, &self.remote) {
                Ok(()) => Reply::Output(self.describe()),
                Err(e) => Reply::Output(format!("error: {}", e)),
            },
            Command::Replace(text) => {
                self.doc.replace_field(self.sync().key(), &text, &self.remote);
                Reply::Output(self.describe())
            }
            Command::Use(key) => match self.bindings.iter().position(|b| b.key() == key) {
                Some(index) => {
                    self.current = index;
                    Reply::Output(self.describe())
                }
                None => Reply::Output(format!("error: field {} is not bound", key)),
            },
            Command::Select { start, end } => {
                buffer.set_selection(Selection::new(start, end));
                Reply::Quiet
            }
            Command::Focus(on) => {
                // One focused buffer at a time, like widgets on a page.
                if on {
                    for binding in &self.bindings {
                        binding.buffer().set_focus(false);
                    }
                }
                buffer.set_focus(on);
                Reply::Quiet
            }
            Command::Scroll(offset) => {
                buffer.set_scroll_offset(offset);
                Reply::Quiet
            }
            Command::Start => {
                let current = self.current;
                if !self.bindings[current].start() {
                    info!("Field {} already started", self.sync().key());
                }
                Reply::Output(self.describe())
            }
            Command::Stop => {
                let current = self.current;
                if !self.bindings[current].stop() {
                    info!("Field {} already stopped", self.sync().key());
                }
                Reply::Quiet
            }
            Command::Show => Reply::Output(self.describe()),
            Command::Help => Reply::Output(HELP.to_string()),
            Command::Quit => Reply::Quit,
        }
    }

    /// One line per bound field; the current one is marked with `*`.
    pub fn describe(&self) -> String {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, sync)| {
                let marker = if i == self.current { "*" } else { " " };
                format!("{}{}: {}", marker, sync.key(), self.describe_binding(sync))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn describe_binding(&self, sync: &Binding) -> String {
        let buffer = sync.buffer();
        let selection = buffer.selection();
        format!(
            "buffer={:?} selection={}..{}{} doc={:?} last={:?} {}",
            buffer.value(),
            selection.start,
            selection.end,
            if buffer.has_focus() { " (focused)" } else { "" },
            self.doc.field_value(sync.key()).unwrap_or_default(),
            sync.last_value(),
            if sync.is_started() { "started" } else { "stopped" },
        )
    }
}
