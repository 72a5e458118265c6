//! # relay-rs
//!
//! Real-time pub/sub relay. Remote applications register with their user
//! agent and host, push named envelopes into a per-application mailbox, and
//! any number of observers follow the envelope sequence over a long-lived
//! HTTP event stream. A late observer first receives the most recent
//! `event` envelope, so it catches up without waiting for the next publish.
//!
//! ```no_run
//! use relay_rs::{RelayServer, ServerConfig};
//!
//! # async fn run() -> relay_rs::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```
//!
//! The registry can also be used directly, without HTTP:
//!
//! ```
//! use relay_rs::registry::{ApplicationRegistry, Envelope, Identity};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), relay_rs::registry::RegistryError> {
//! let registry = ApplicationRegistry::new();
//! let id = registry.register(Identity::new("Mozilla/5.0", "localhost:3449")).await;
//!
//! registry.publish(&id, Envelope::event("{\"count\":1}")).await?;
//!
//! let mut subscription = registry.attach(&id).await?;
//! assert_eq!(subscription.recv().await, Some(Envelope::event("{\"count\":1}")));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod server;
pub mod stats;
pub mod wire;

pub use error::{Error, Result};
pub use registry::{AppId, ApplicationRegistry, Envelope, Identity, RegistryConfig};
pub use server::{RelayServer, ServerConfig};
