//! Per-application dispatcher task
//!
//! Every application owns exactly one dispatcher. It is the only task that
//! touches the subscriber set and the replay cache; everything else talks to
//! it through the application's mailbox, so attach, detach and publish are
//! totally ordered without a lock.
//!
//! Fan-out goes through a `tokio::sync::broadcast` channel whose capacity is
//! the per-subscriber queue bound. Sending never waits on a receiver, so a
//! stalled subscriber only ever lags itself.
//!
//! A subscriber that stops reading entirely never observes its own lag. The
//! dispatcher therefore watches the channel backlog after every send and
//! reports it in [`ApplicationStats::max_backlog`].

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::stats::ApplicationStats;

use super::config::RegistryConfig;
use super::envelope::{AppId, Envelope};

/// Identifier of a subscriber, unique within one application
pub type SubscriberId = u64;

/// Mailbox commands, processed strictly in arrival order
pub(super) enum Command {
    /// Fan an envelope out and update the replay cache
    Publish(Envelope),
    /// Add a subscriber
    Attach { reply: oneshot::Sender<Attachment> },
    /// Remove a subscriber; unknown ids are ignored
    Detach { subscriber: SubscriberId },
    /// A subscriber skipped envelopes because it fell behind
    Lagged {
        subscriber: SubscriberId,
        skipped: u64,
    },
    /// Snapshot statistics
    Stats {
        reply: oneshot::Sender<ApplicationStats>,
    },
}

/// Everything a new subscriber needs, captured at one point in mailbox order
pub(super) struct Attachment {
    pub subscriber: SubscriberId,
    pub replay: Option<Envelope>,
    pub rx: broadcast::Receiver<Envelope>,
}

struct SubscriberState {
    attached_at: Instant,
    dropped: u64,
}

pub(super) struct Dispatcher {
    app: AppId,
    mailbox: mpsc::UnboundedReceiver<Command>,
    tx: broadcast::Sender<Envelope>,
    capacity: usize,
    saturated: bool,
    subscribers: HashMap<SubscriberId, SubscriberState>,
    last_event: Option<Envelope>,
    next_subscriber: SubscriberId,
    events_published: u64,
    actions_published: u64,
    envelopes_dropped: u64,
    created_at: Instant,
}

impl Dispatcher {
    /// Start the dispatcher for `app` and return its mailbox
    ///
    /// The task runs until every mailbox sender is dropped. The registry keeps
    /// one for the life of the process.
    pub(super) fn spawn(
        app: AppId,
        config: &RegistryConfig,
    ) -> (mpsc::UnboundedSender<Command>, JoinHandle<()>) {
        let (mailbox_tx, mailbox) = mpsc::unbounded_channel();
        let capacity = config.queue_capacity();
        let (tx, _) = broadcast::channel(capacity);

        let dispatcher = Self {
            app,
            mailbox,
            tx,
            capacity,
            saturated: false,
            subscribers: HashMap::new(),
            last_event: None,
            next_subscriber: 0,
            events_published: 0,
            actions_published: 0,
            envelopes_dropped: 0,
            created_at: Instant::now(),
        };

        (mailbox_tx, tokio::spawn(dispatcher.run()))
    }

    async fn run(mut self) {
        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }

        tracing::debug!(app = %self.app, "Dispatcher stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Publish(envelope) => self.publish(envelope),
            Command::Attach { reply } => {
                let attachment = self.attach();
                let subscriber = attachment.subscriber;

                // Requester went away before the reply; undo the attach
                if reply.send(attachment).is_err() {
                    self.detach(subscriber);
                }
            }
            Command::Detach { subscriber } => self.detach(subscriber),
            Command::Lagged {
                subscriber,
                skipped,
            } => {
                self.envelopes_dropped += skipped;
                if let Some(state) = self.subscribers.get_mut(&subscriber) {
                    state.dropped += skipped;
                }
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn publish(&mut self, envelope: Envelope) {
        if envelope.is_event() {
            self.events_published += 1;
            self.last_event = Some(envelope.clone());
        } else {
            self.actions_published += 1;
        }

        // Err only means nobody is listening
        let receivers = self.tx.send(envelope).unwrap_or(0);

        tracing::trace!(
            app = %self.app,
            receivers = receivers,
            "Envelope dispatched"
        );

        // Queued envelopes not yet seen by the slowest receiver
        let backlog = self.tx.len();
        if backlog >= self.capacity {
            if !self.saturated {
                self.saturated = true;
                tracing::warn!(
                    app = %self.app,
                    backlog = backlog,
                    capacity = self.capacity,
                    subscribers = self.subscribers.len(),
                    "Subscriber queue full, slowest subscriber is stalled"
                );
            }
        } else if self.saturated {
            self.saturated = false;
            tracing::debug!(
                app = %self.app,
                backlog = backlog,
                "Subscriber queue drained"
            );
        }
    }

    fn attach(&mut self) -> Attachment {
        let subscriber = self.next_subscriber;
        self.next_subscriber += 1;

        self.subscribers.insert(
            subscriber,
            SubscriberState {
                attached_at: Instant::now(),
                dropped: 0,
            },
        );

        tracing::debug!(
            app = %self.app,
            subscriber = subscriber,
            subscribers = self.subscribers.len(),
            replay = self.last_event.is_some(),
            "Subscriber attached"
        );

        Attachment {
            subscriber,
            replay: self.last_event.clone(),
            rx: self.tx.subscribe(),
        }
    }

    fn detach(&mut self, subscriber: SubscriberId) {
        match self.subscribers.remove(&subscriber) {
            Some(state) => {
                tracing::debug!(
                    app = %self.app,
                    subscriber = subscriber,
                    subscribers = self.subscribers.len(),
                    attached_for = ?state.attached_at.elapsed(),
                    dropped = state.dropped,
                    "Subscriber detached"
                );
            }
            None => {
                tracing::trace!(
                    app = %self.app,
                    subscriber = subscriber,
                    "Detach of unknown subscriber"
                );
            }
        }
    }

    fn stats(&self) -> ApplicationStats {
        ApplicationStats {
            subscriber_count: self.subscribers.len(),
            events_published: self.events_published,
            actions_published: self.actions_published,
            envelopes_dropped: self.envelopes_dropped,
            last_event: self.last_event.clone(),
            max_backlog: self.tx.len(),
            queue_capacity: self.capacity,
            uptime: self.created_at.elapsed(),
        }
    }
}
