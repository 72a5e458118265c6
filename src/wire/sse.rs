//! Event-stream records for envelopes
//!
//! Each envelope becomes one server-sent event:
//!
//! ```text
//! event: <kind>\n
//! data: <payload line>\n     (one per payload line)
//! \n
//! ```
//!
//! Framing and keep-alive comments are written by axum's [`Sse`] response;
//! this module only decides what goes into each record.
//!
//! Event fields must be UTF-8 text without line breaks, so:
//!
//! - CR or LF inside the kind would end the `event:` line early and are
//!   replaced with spaces.
//! - Payload line breaks (`\n`, `\r\n` or a lone `\r`) start a new `data:`
//!   line. Consumers join the lines back with `\n`.
//! - Payload bytes that are not valid UTF-8 are replaced with U+FFFD.
//!
//! [`Sse`]: axum::response::sse::Sse

use std::borrow::Cow;

use axum::response::sse::Event;

use crate::registry::Envelope;

/// Text of the comment record written to idle streams
pub const KEEP_ALIVE_TEXT: &str = "keep-alive";

/// Build the record for one envelope
pub fn to_event(envelope: &Envelope) -> Event {
    Event::default()
        .event(kind_field(envelope.kind().as_str()))
        .data(data_field(envelope.payload()))
}

fn kind_field(kind: &str) -> Cow<'_, str> {
    if kind.contains(['\r', '\n']) {
        Cow::Owned(kind.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(kind)
    }
}

fn data_field(payload: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(payload);
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        text
    }
}
