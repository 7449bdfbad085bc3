//! Diagnostic log line parsing
//!
//! Lines follow `HH:MM:SS [TAG] message`. Anything else is still a valid
//! line: it is displayed as a message with empty time and tag.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag for a completed step
pub const TAG_OK: &str = "[OK]";
/// Tag for an in-progress step
pub const TAG_IN_PROGRESS: &str = "[..]";
/// Tag for a notable finding
pub const TAG_FINDING: &str = "[!!]";

static LOG_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2}:[0-9]{2}:[0-9]{2})\s+(\[[^\]]+\])\s+(.+)$").expect("log line pattern is valid")
});

static LOG_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}\s+\[").expect("log prefix pattern is valid"));

/// Result of matching a raw line against the log format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    Structured {
        time: &'a str,
        tag: &'a str,
        message: &'a str,
    },
    Unstructured(&'a str),
}

/// Match a raw line against `HH:MM:SS [TAG] message`
pub fn parse_log_line(raw: &str) -> ParsedLine<'_> {
    match LOG_LINE_RE.captures(raw) {
        Some(caps) => match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(time), Some(tag), Some(message)) => ParsedLine::Structured {
                time: time.as_str(),
                tag: tag.as_str(),
                message: message.as_str(),
            },
            _ => ParsedLine::Unstructured(raw),
        },
        None => ParsedLine::Unstructured(raw),
    }
}

/// True if the line starts with a timestamp followed by a tag bracket
pub fn has_log_prefix(raw: &str) -> bool {
    LOG_PREFIX_RE.is_match(raw)
}

/// One displayed diagnostic log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub tag: String,
    pub message: String,
}

impl LogLine {
    pub fn new(time: impl Into<String>, tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Line with empty time and tag
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::new("", "", message)
    }

    /// Parse a raw line, falling back to a message-only line
    pub fn parse(raw: &str) -> Self {
        match parse_log_line(raw) {
            ParsedLine::Structured { time, tag, message } => Self::new(time, tag, message),
            ParsedLine::Unstructured(text) => Self::message_only(text),
        }
    }

    pub fn is_structured(&self) -> bool {
        !self.time.is_empty() && !self.tag.is_empty()
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_structured() {
            write!(f, "{} {} {}", self.time, self.tag, self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}
