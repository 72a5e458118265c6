//! Application registry and per-application fan-out
//!
//! The registry identifies applications and routes envelopes from producers
//! to subscribers. Each application runs one dispatcher task that owns its
//! subscriber set and replay cache; publish, attach and detach are commands
//! on the dispatcher's mailbox, so they are totally ordered per application.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<ApplicationRegistry>
//!                 ┌──────────────────────────────┐
//!                 │ by_identity: Identity → id   │
//!                 │ by_id: id → Application {    │
//!                 │   mailbox: mpsc::Tx<Command> │
//!                 │ }                            │
//!                 └──────────────┬───────────────┘
//!                                │
//!     publish() ──► mailbox ──► Dispatcher { subscribers, last_event,
//!     attach()  ──►            │               tx: broadcast::Tx }
//!     detach    ──►            │
//!                 ┌────────────┼────────────┐
//!                 ▼            ▼            ▼
//!           [Subscription] [Subscription] [Subscription]
//!            rx.recv()      rx.recv()      rx.recv()
//! ```
//!
//! # Slow subscribers
//!
//! The broadcast channel gives every subscriber its own read position over a
//! bounded ring. The dispatcher never waits on a subscriber; one that falls
//! more than `subscriber_capacity` envelopes behind is handled by the
//! configured [`OverflowPolicy`] without affecting anyone else.
//!
//! A subscriber that stops reading altogether shows up as a full queue in
//! [`ApplicationStats::max_backlog`](crate::stats::ApplicationStats::max_backlog).

pub mod config;
pub mod dispatcher;
pub mod entry;
pub mod envelope;
pub mod error;
pub mod store;
pub mod subscription;

pub use config::{OverflowPolicy, RegistryConfig, MAX_SUBSCRIBER_CAPACITY};
pub use dispatcher::SubscriberId;
pub use entry::Application;
pub use envelope::{AppId, Envelope, Identity, Kind};
pub use error::RegistryError;
pub use store::ApplicationRegistry;
pub use subscription::Subscription;
