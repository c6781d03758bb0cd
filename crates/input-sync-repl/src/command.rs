//! Line-oriented commands read from stdin.

use input_sync_core::FieldOp;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Expected `on` or `off`, got {0}")]
    InvalidToggle(String),

    #[error("Invalid op batch: {0}")]
    InvalidOps(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the buffer value as if the user typed it.
    Type(String),
    /// Submit ops to the document from a remote source.
    Remote(Vec<FieldOp>),
    /// Replace the whole field from a remote source.
    Replace(String),
    /// Switch the field the other commands act on.
    Use(String),
    Select { start: usize, end: usize },
    Focus(bool),
    Scroll(f64),
    Start,
    Stop,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let line = line.trim_start();
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (line.trim_end(), ""),
        };

        let command = match name {
            "type" => Command::Type(unescape(rest)),
            "remote" => {
                if rest.trim().is_empty() {
                    return Err(ParseError::MissingArgument("op batch"));
                }
                Command::Remote(serde_json::from_str(rest)?)
            }
            "replace" => Command::Replace(unescape(rest)),
            "use" => match rest.trim() {
                "" => return Err(ParseError::MissingArgument("key")),
                key => Command::Use(key.to_string()),
            },
            "select" => {
                let mut args = rest.split_whitespace();
                let start = parse_number(args.next(), "start")?;
                let end = match args.next() {
                    Some(end) => parse_number(Some(end), "end")?,
                    None => start,
                };
                Command::Select { start, end }
            }
            "focus" => match rest.trim() {
                "on" => Command::Focus(true),
                "off" => Command::Focus(false),
                "" => return Err(ParseError::MissingArgument("on|off")),
                other => return Err(ParseError::InvalidToggle(other.to_string())),
            },
            "scroll" => {
                let arg = rest.trim();
                if arg.is_empty() {
                    return Err(ParseError::MissingArgument("offset"));
                }
                Command::Scroll(
                    arg.parse()
                        .map_err(|_| ParseError::InvalidNumber(arg.to_string()))?,
                )
            }
            "start" => Command::Start,
            "stop" => Command::Stop,
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_number(arg: Option<&str>, name: &'static str) -> Result<usize, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(name))?;
    arg.parse()
        .map_err(|_| ParseError::InvalidNumber(arg.to_string()))
}

/// Expand `\n`, `\r`, `\t` and `\\` so multi-line values fit on one line.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

pub const HELP: &str = "\
commands:
  type <text>         set the buffer as if typed, then sync (\\n, \\r, \\t escapes)
  remote <json>       submit ops from another client, e.g. [{\"p\":[\"valueA\"],\"t\":\"text\",\"o\":[3,\"X\"]}]
  replace <text>      replace the whole field from another client
  use <key>           switch the field the other commands act on
  select <start> [end]
  focus on|off
  scroll <offset>
  start | stop | show | help | quit";

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Type(text) => write!(f, "type {:?}", text),
            Command::Remote(ops) => write!(f, "remote ({} op(s))", ops.len()),
            Command::Replace(text) => write!(f, "replace {:?}", text),
            Command::Use(key) => write!(f, "use {}", key),
            Command::Select { start, end } => write!(f, "select {} {}", start, end),
            Command::Focus(on) => write!(f, "focus {}", if *on { "on" } else { "off" }),
            Command::Scroll(offset) => write!(f, "scroll {}", offset),
            Command::Start => f.write_str("start"),
            Command::Stop => f.write_str("stop"),
            Command::Show => f.write_str("show"),
            Command::Help => f.write_str("help"),
            Command::Quit => f.write_str("quit"),
        }
    }
}
