//! Event-stream response for one subscriber
//!
//! The stream owns the [`Subscription`]. When the peer goes away hyper drops
//! the response body, which drops the subscription and detaches it.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};

use crate::registry::Subscription;
use crate::wire;

/// Build the event-stream response for an attached subscriber
///
/// With `keep_alive` set, a comment record is sent whenever the stream has
/// been idle for that long.
pub fn event_stream(
    mut subscription: Subscription,
    keep_alive: Option<Duration>,
) -> Response {
    let stream = async_stream::stream! {
        while let Some(envelope) = subscription.recv().await {
            yield Ok::<_, Infallible>(wire::to_event(&envelope));
        }

        tracing::debug!(
            app = %subscription.app(),
            subscriber = subscription.id(),
            "Event stream ended by relay"
        );
    };

    let sse = Sse::new(stream);
    match keep_alive {
        Some(interval) => sse.keep_alive(
            KeepAlive::new()
                .interval(interval)
                .text(wire::KEEP_ALIVE_TEXT),
        )
        .into_response(),
        None => sse.into_response(),
    }
}
