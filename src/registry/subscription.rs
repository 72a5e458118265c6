//! Subscriber connections
//!
//! A [`Subscription`] is one attachment to an application's envelope
//! sequence. It is detached when dropped, so tying it to the lifetime of the
//! stream that owns it guarantees cleanup on every exit path.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use super::config::OverflowPolicy;
use super::dispatcher::{Attachment, Command, SubscriberId};
use super::envelope::{AppId, Envelope};

/// An attached subscriber
pub struct Subscription {
    app: AppId,
    id: SubscriberId,
    replay: Option<Envelope>,
    rx: broadcast::Receiver<Envelope>,
    mailbox: mpsc::UnboundedSender<Command>,
    overflow_policy: OverflowPolicy,
    closed: bool,
}

impl Subscription {
    pub(super) fn new(
        app: AppId,
        attachment: Attachment,
        mailbox: mpsc::UnboundedSender<Command>,
        overflow_policy: OverflowPolicy,
    ) -> Self {
        Self {
            app,
            id: attachment.subscriber,
            replay: attachment.replay,
            rx: attachment.rx,
            mailbox,
            overflow_policy,
            closed: false,
        }
    }

    /// Subscriber id, unique within the application
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Application this subscriber is attached to
    pub fn app(&self) -> &AppId {
        &self.app
    }

    /// Wait for the next envelope
    ///
    /// The cached last event, if there was one at attach time, comes first.
    /// Returns `None` once the subscription has been closed by the overflow
    /// policy or the dispatcher has stopped. Cancel safe.
    pub async fn recv(&mut self) -> Option<Envelope> {
        if let Some(envelope) = self.replay.take() {
            return Some(envelope);
        }

        while !self.closed {
            match self.rx.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    let reported = self.mailbox.send(Command::Lagged {
                        subscriber: self.id,
                        skipped,
                    });

                    // Dispatcher has stopped; the sender may outlive it
                    if reported.is_err() {
                        tracing::debug!(
                            app = %self.app,
                            subscriber = self.id,
                            "Dispatcher gone, closing subscription"
                        );
                        self.closed = true;
                        continue;
                    }

                    match self.overflow_policy {
                        OverflowPolicy::DropOldest => {
                            tracing::warn!(
                                app = %self.app,
                                subscriber = self.id,
                                skipped = skipped,
                                "Subscriber fell behind, dropped oldest envelopes"
                            );
                        }
                        OverflowPolicy::Disconnect => {
                            tracing::warn!(
                                app = %self.app,
                                subscriber = self.id,
                                skipped = skipped,
                                "Subscriber fell behind, disconnecting"
                            );
                            self.closed = true;
                        }
                    }
                }
                Err(RecvError::Closed) => self.closed = true,
            }
        }

        None
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Dispatcher gone means there is nothing left to detach from
        let _ = self.mailbox.send(Command::Detach {
            subscriber: self.id,
        });
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("app", &self.app)
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish()
    }
}
