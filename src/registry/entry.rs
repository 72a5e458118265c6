//! Application entries
//!
//! This module defines the per-application handle stored in the registry.

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::stats::ApplicationStats;

use super::config::{OverflowPolicy, RegistryConfig};
use super::dispatcher::{Command, Dispatcher};
use super::envelope::{AppId, Envelope, Identity};
use super::error::RegistryError;
use super::subscription::Subscription;

/// Handle to a registered application
///
/// Cloning is cheap; all clones feed the same mailbox. The subscriber set
/// and replay cache live inside the dispatcher task, not here.
#[derive(Debug, Clone)]
pub struct Application {
    id: AppId,
    identity: Identity,
    seq: u64,
    registered_at: Instant,
    mailbox: mpsc::UnboundedSender<Command>,
    overflow_policy: OverflowPolicy,
}

impl Application {
    /// Create the application and start its dispatcher
    pub(super) fn spawn(seq: u64, identity: Identity, config: &RegistryConfig) -> Self {
        let id = AppId::from(seq);
        let (mailbox, _dispatcher) = Dispatcher::spawn(id.clone(), config);

        Self {
            id,
            identity,
            seq,
            registered_at: Instant::now(),
            mailbox,
            overflow_policy: config.overflow_policy,
        }
    }

    pub fn id(&self) -> &AppId {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Registration order, starting at 0
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn registered_at(&self) -> Instant {
        self.registered_at
    }

    /// Enqueue an envelope for fan-out
    ///
    /// Returns as soon as the envelope is in the mailbox; delivery happens on
    /// the dispatcher task.
    pub fn publish(&self, envelope: Envelope) -> Result<(), RegistryError> {
        self.mailbox
            .send(Command::Publish(envelope))
            .map_err(|_| RegistryError::DispatcherClosed(self.id.clone()))
    }

    /// Attach a new subscriber
    ///
    /// The returned subscription first yields the cached last event (if any),
    /// then every envelope published after this call was processed.
    pub async fn attach(&self) -> Result<Subscription, RegistryError> {
        let (reply, rx) = oneshot::channel();

        self.mailbox
            .send(Command::Attach { reply })
            .map_err(|_| RegistryError::DispatcherClosed(self.id.clone()))?;

        let attachment = rx
            .await
            .map_err(|_| RegistryError::DispatcherClosed(self.id.clone()))?;

        Ok(Subscription::new(
            self.id.clone(),
            attachment,
            self.mailbox.clone(),
            self.overflow_policy,
        ))
    }

    /// Snapshot statistics, ordered after every previously enqueued command
    pub async fn stats(&self) -> Result<ApplicationStats, RegistryError> {
        let (reply, rx) = oneshot::channel();

        self.mailbox
            .send(Command::Stats { reply })
            .map_err(|_| RegistryError::DispatcherClosed(self.id.clone()))?;

        rx.await
            .map_err(|_| RegistryError::DispatcherClosed(self.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_test::{assert_pending, task};

    use super::*;

    fn app(config: &RegistryConfig) -> Application {
        Application::spawn(0, Identity::new("ua", "host"), config)
    }

    async fn next(sub: &mut Subscription) -> Option<Envelope> {
        timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("timed out waiting for envelope")
    }

    #[tokio::test]
    async fn test_replay_without_new_publish() {
        let app = app(&RegistryConfig::default());
        app.publish(Envelope::event("state")).unwrap();

        let mut sub = app.attach().await.unwrap();

        assert_eq!(next(&mut sub).await, Some(Envelope::event("state")));
    }

    #[tokio::test]
    async fn test_no_replay_of_actions() {
        let app = app(&RegistryConfig::default());
        app.publish(Envelope::action("a1")).unwrap();
        app.publish(Envelope::action("a2")).unwrap();

        let mut sub = app.attach().await.unwrap();

        let mut recv = task::spawn(sub.recv());
        assert_pending!(recv.poll());
        drop(recv);

        app.publish(Envelope::action("a3")).unwrap();
        assert_eq!(next(&mut sub).await, Some(Envelope::action("a3")));
    }

    #[tokio::test]
    async fn test_fan_out_order() {
        let app = app(&RegistryConfig::default());

        let mut subs = Vec::new();
        for _ in 0..4 {
            subs.push(app.attach().await.unwrap());
        }

        let published: Vec<Envelope> = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    Envelope::action(format!("a{}", i))
                } else {
                    Envelope::event(format!("e{}", i))
                }
            })
            .collect();

        for envelope in &published {
            app.publish(envelope.clone()).unwrap();
        }

        for sub in &mut subs {
            let mut received = Vec::new();
            for _ in 0..published.len() {
                received.push(next(sub).await.unwrap());
            }
            assert_eq!(received, published);
        }
    }

    #[tokio::test]
    async fn test_detach_on_drop() {
        let app = app(&RegistryConfig::default());

        let first = app.attach().await.unwrap();
        let mut second = app.attach().await.unwrap();
        assert_eq!(app.stats().await.unwrap().subscriber_count, 2);

        drop(first);
        assert_eq!(app.stats().await.unwrap().subscriber_count, 1);

        app.publish(Envelope::event("after")).unwrap();
        assert_eq!(next(&mut second).await, Some(Envelope::event("after")));
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_oldest() {
        let config = RegistryConfig::default().subscriber_capacity(2);
        let app = app(&config);

        let mut slow = app.attach().await.unwrap();
        let mut fast = app.attach().await.unwrap();

        for i in 0..5 {
            app.publish(Envelope::event(format!("e{}", i))).unwrap();
            assert_eq!(
                next(&mut fast).await,
                Some(Envelope::event(format!("e{}", i)))
            );
        }

        // Only the newest `capacity` envelopes survive for the slow one
        assert_eq!(next(&mut slow).await, Some(Envelope::event("e3")));
        assert_eq!(next(&mut slow).await, Some(Envelope::event("e4")));

        let stats = app.stats().await.unwrap();
        assert_eq!(stats.envelopes_dropped, 3);
        assert_eq!(stats.subscriber_count, 2);
    }

    #[tokio::test]
    async fn test_slow_subscriber_disconnected() {
        let config = RegistryConfig::default()
            .subscriber_capacity(2)
            .overflow_policy(OverflowPolicy::Disconnect);
        let app = app(&config);

        let mut slow = app.attach().await.unwrap();

        for i in 0..5 {
            app.publish(Envelope::event(format!("e{}", i))).unwrap();
        }
        app.stats().await.unwrap();

        assert_eq!(next(&mut slow).await, None);
        assert_eq!(next(&mut slow).await, None);

        drop(slow);
        assert_eq!(app.stats().await.unwrap().subscriber_count, 0);
    }
}
