//! Wire encoding of envelopes for streaming subscribers

pub mod sse;

pub use sse::{to_event, KEEP_ALIVE_TEXT};
