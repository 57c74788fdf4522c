//! SSE event model and wire encoding.
//!
//! Every heartbeat is a single unnamed (`message`) event carrying one
//! `data:` line:
//!
//! ```text
//! data: The server time is: Mon, 02 Jan 2006 15:04:05 -0700\n\n
//! ```
//!
//! The trailing blank line terminates the event, so the payload itself
//! may never contain a line break.

use chrono::{DateTime, FixedOffset};

use crate::error::EventError;

/// Field prefix for an SSE data line.
const DATA_PREFIX: &str = "data: ";

/// Blank-line terminator that ends one SSE event.
const EVENT_TERMINATOR: &str = "\n\n";

/// Text placed in front of the timestamp in every heartbeat.
const MESSAGE_PREFIX: &str = "The server time is: ";

/// RFC 2822 layout with a two-digit day and a numeric zone offset.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Format a timestamp the way it appears inside a heartbeat.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp previously produced by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc2822(s)
}

/// A validated SSE event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatEvent {
    data: String,
}

impl HeartbeatEvent {
    /// Build an event from arbitrary data, rejecting payloads that would
    /// break SSE framing.
    pub fn new(data: impl Into<String>) -> Result<Self, EventError> {
        let data = data.into();
        if data.is_empty() {
            return Err(EventError::Empty);
        }
        if data.contains(['\n', '\r']) {
            return Err(EventError::EmbeddedNewline);
        }
        Ok(Self { data })
    }

    /// Build the server-time heartbeat for the given instant.
    pub fn at(timestamp: &DateTime<FixedOffset>) -> Self {
        // The formatted timestamp never contains a line break.
        Self {
            data: format!("{MESSAGE_PREFIX}{}", format_timestamp(timestamp)),
        }
    }

    /// The event payload (the text after `data: `).
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The timestamp carried by a server-time heartbeat, if this is one.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.data
            .strip_prefix(MESSAGE_PREFIX)
            .and_then(|ts| parse_timestamp(ts).ok())
    }

    /// Encode the event into its exact wire form.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            DATA_PREFIX
                .len()
                .saturating_add(self.data.len())
                .saturating_add(EVENT_TERMINATOR.len()),
        );
        out.push_str(DATA_PREFIX);
        out.push_str(&self.data);
        out.push_str(EVENT_TERMINATOR);
        out
    }

    /// Decode a single encoded event back into a [`HeartbeatEvent`].
    ///
    /// Accepts exactly the form produced by [`encode`](Self::encode).
    pub fn decode(frame: &str) -> Option<Self> {
        let data = frame
            .strip_prefix(DATA_PREFIX)?
            .strip_suffix(EVENT_TERMINATOR)?;
        Self::new(data).ok()
    }
}
