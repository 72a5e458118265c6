//! Application registry implementation
//!
//! The central registry that identifies applications and hands out their
//! handles. Per-application state is owned by each application's dispatcher;
//! the registry only maps ids and identities to handles.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::stats::ApplicationStats;

use super::config::RegistryConfig;
use super::entry::Application;
use super::envelope::{AppId, Envelope, Identity};
use super::error::RegistryError;
use super::subscription::Subscription;

#[derive(Default)]
struct Applications {
    by_id: HashMap<AppId, Application>,
    by_identity: HashMap<Identity, AppId>,
    next_seq: u64,
}

/// Central registry for all applications
///
/// Thread-safe via `RwLock`. Lookups on the publish and attach paths take the
/// read lock only; registration of a new identity takes the write lock.
/// Entries are never removed.
pub struct ApplicationRegistry {
    applications: RwLock<Applications>,

    config: RegistryConfig,
}

impl ApplicationRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            applications: RwLock::new(Applications::default()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register an application
    ///
    /// Returns the existing id if this exact identity registered before.
    /// Otherwise assigns the next id and starts the application's dispatcher.
    pub async fn register(&self, identity: Identity) -> AppId {
        let mut applications = self.applications.write().await;

        if let Some(id) = applications.by_identity.get(&identity) {
            tracing::debug!(
                app = %id,
                host = %identity.host,
                user_agent = %identity.user_agent,
                "Application already registered"
            );
            return id.clone();
        }

        let seq = applications.next_seq;
        let app = Application::spawn(seq, identity.clone(), &self.config);
        let id = app.id().clone();
        applications.next_seq = seq + 1;

        tracing::info!(
            app = %id,
            host = %identity.host,
            user_agent = %identity.user_agent,
            "Application registered"
        );

        applications.by_identity.insert(identity, id.clone());
        applications.by_id.insert(id.clone(), app);

        id
    }

    /// Look up an application by id
    pub async fn get(&self, id: &AppId) -> Result<Application, RegistryError> {
        self.applications
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::ApplicationNotFound(id.clone()))
    }

    /// Publish an envelope to an application
    pub async fn publish(&self, id: &AppId, envelope: Envelope) -> Result<(), RegistryError> {
        self.get(id).await?.publish(envelope)
    }

    /// Attach a subscriber to an application
    pub async fn attach(&self, id: &AppId) -> Result<Subscription, RegistryError> {
        self.get(id).await?.attach().await
    }

    /// Get statistics for an application
    pub async fn stats(&self, id: &AppId) -> Result<ApplicationStats, RegistryError> {
        self.get(id).await?.stats().await
    }

    /// All applications in registration order
    pub async fn applications(&self) -> Vec<Application> {
        let mut apps: Vec<Application> = self
            .applications
            .read()
            .await
            .by_id
            .values()
            .cloned()
            .collect();

        apps.sort_by_key(Application::seq);
        apps
    }

    /// Get total number of applications
    pub async fn application_count(&self) -> usize {
        self.applications.read().await.by_id.len()
    }
}

impl Default for ApplicationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
