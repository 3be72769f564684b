//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to feed chat traffic and
//! administer spawn rules.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use catch_core::{Catalog, GameConfig};

use crate::api::{
    InMemoryInventory, Inventory, Permissions, Result, RuntimeError, RuntimeHandle,
    StaticPermissions, Transport,
};
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::events::{EventBus, SpawnEvent, Topic};
use crate::game::SharedGame;
use crate::repository::{FileRuleRepository, RuleRepository};
use crate::rules::SpawnRuleStore;
use crate::scheduler::{SpawnScheduler, TimerSupervisor};
use crate::workers::{Command, MessageWorker};

/// Main runtime that runs the spawn/catch engine
///
/// Runtime owns the workers; [`RuntimeHandle`] is the cloneable façade for
/// clients.
pub struct Runtime {
    handle: RuntimeHandle,
    shutdown: watch::Sender<bool>,
    message_worker_handle: JoinHandle<()>,
    supervisor_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SpawnEvent> {
        self.handle.subscribe(topic)
    }

    /// Stop the timer tasks and the message worker, letting in-flight
    /// messages finish.
    pub async fn shutdown(self) -> Result<()> {
        // Both receivers may already be gone if a worker exited early.
        let _ = self.shutdown.send(true);

        self.supervisor_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        self.message_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        tracing::info!("runtime stopped");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
///
/// A catalog and a transport are required. Everything else has a default:
/// rules in a [`FileRuleRepository`] under the configured data directory,
/// an [`InMemoryInventory`], no elevated users and the [`SystemClock`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    game_config: GameConfig,
    catalog: Option<Arc<Catalog>>,
    transport: Option<Arc<dyn Transport>>,
    inventory: Option<Arc<dyn Inventory>>,
    permissions: Option<Arc<dyn Permissions>>,
    clock: Option<Arc<dyn Clock>>,
    repository: Option<Arc<dyn RuleRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            game_config: GameConfig::default(),
            catalog: None,
            transport: None,
            inventory: None,
            permissions: None,
            clock: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Set the item catalog (required)
    pub fn catalog(mut self, catalog: impl Into<Arc<Catalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Set the chat transport (required)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn inventory(mut self, inventory: Arc<dyn Inventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn Permissions>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the file-backed rule repository
    pub fn repository(mut self, repository: Arc<dyn RuleRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime and start its workers
    pub async fn build(self) -> Result<Runtime> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;
        let transport = self.transport.ok_or(RuntimeError::MissingTransport)?;

        let repository: Arc<dyn RuleRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(FileRuleRepository::new(&self.config.data_dir)?),
        };
        let rules = Arc::new(SpawnRuleStore::open(repository));

        let inventory = self
            .inventory
            .unwrap_or_else(|| Arc::new(InMemoryInventory::new()));
        let permissions = self
            .permissions
            .unwrap_or_else(|| Arc::new(StaticPermissions::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let scheduler = Arc::new(SpawnScheduler::new(
            SharedGame::new(catalog, self.game_config, self.config.rng_seed),
            Arc::clone(&rules),
            inventory,
            transport,
            permissions,
            clock,
            EventBus::with_capacity(self.config.event_buffer),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.message_buffer);

        let message_worker =
            MessageWorker::new(Arc::clone(&scheduler), command_rx, shutdown_rx.clone());
        let message_worker_handle = tokio::spawn(async move {
            message_worker.run().await;
        });

        let supervisor = TimerSupervisor::new(Arc::clone(&scheduler), self.config.timer_retry);
        let supervisor_handle = tokio::spawn(async move {
            supervisor.run(shutdown_rx).await;
        });

        tracing::info!(
            items = scheduler.game().catalog().len(),
            rules = rules.list().len(),
            timers = rules.timed_channels().len(),
            "runtime started"
        );

        Ok(Runtime {
            handle: RuntimeHandle::new(command_tx, scheduler),
            shutdown: shutdown_tx,
            message_worker_handle,
            supervisor_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRuleRepository;
    use crate::scheduler::tests::{RecordingTransport, catalog};

    #[tokio::test]
    async fn build_requires_catalog_and_transport() {
        let err = Runtime::builder().build().await.err().unwrap();
        assert!(matches!(err, RuntimeError::MissingCatalog));

        let err = Runtime::builder()
            .catalog(catalog())
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::MissingTransport));
    }

    #[tokio::test]
    async fn build_and_shutdown() {
        let runtime = Runtime::builder()
            .catalog(catalog())
            .transport(Arc::new(RecordingTransport::default()))
            .repository(Arc::new(InMemoryRuleRepository::new()))
            .build()
            .await
            .unwrap();
        let handle = runtime.handle();
        runtime.shutdown().await.unwrap();
        assert!(handle.submit(crate::scheduler::InboundMessage::new(
            catch_core::ChannelId(1),
            catch_core::GuildId(1),
            catch_core::UserId(1),
            "hi",
        ))
        .await
        .is_err());
    }
}
