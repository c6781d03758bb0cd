//! input-sync-repl library: command parsing and session handling for the
//! REPL binary, exposed for testing.

pub mod command;
pub mod session;

pub use command::{Command, ParseError};
pub use session::{Reply, Session, SessionError};
