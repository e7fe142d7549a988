//! Service registry for dependency injection and lifecycle management.
//!
//! The registry holds the core infrastructure (config, document store,
//! blob store, push gateway, event bus), initializes services in order,
//! and handles ordered shutdown.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use td_core::config::ConfigHandle;
use td_core::error::{TdError, TdResult};
use td_push::PushGateway;
use td_store::{BlobStore, Database};

use crate::eraser::EraserService;
use crate::event_bus::EventBus;
use crate::relay::RelayService;
use crate::router::TriggerRouter;
use crate::service::{Service, ServiceState};

/// Central service registry that manages backend services.
///
/// Provides dependency injection by holding shared references to core
/// infrastructure and managing service lifecycle in the correct order.
pub struct ServiceRegistry {
    /// Application configuration.
    pub config: ConfigHandle,
    /// Document store.
    pub database: Database,
    /// Blob store.
    pub blobs: BlobStore,
    /// Push gateway.
    pub gateway: Arc<dyn PushGateway>,
    /// Store-level event bus.
    pub event_bus: EventBus,
    /// Registered services in initialization order.
    services: Vec<(String, Arc<RwLock<Box<dyn Service>>>)>,
}

impl ServiceRegistry {
    /// Create a new ServiceRegistry with core infrastructure.
    pub fn new(
        config: ConfigHandle,
        database: Database,
        blobs: BlobStore,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            config,
            database,
            blobs,
            gateway,
            event_bus: EventBus::new(256),
            services: Vec::new(),
        }
    }

    /// Register a service. Services are initialized in registration order.
    pub fn register<S: Service + 'static>(&mut self, service: S) {
        let name = service.name().to_string();
        info!("registered service: {name}");
        self.services
            .push((name, Arc::new(RwLock::new(Box::new(service)))));
    }

    /// Register all default services in dependency order.
    ///
    /// Initialization order:
    /// 1. Eraser (database, blobs, event_bus)
    /// 2. Relay (database, gateway)
    /// 3. Router (relay)
    pub fn register_all(&mut self, invite_url_base: &str) {
        self.register(self.make_eraser());
        self.register(self.make_relay(invite_url_base));
        self.register(self.make_router(invite_url_base));

        info!("registered {} default services", self.services.len());
    }

    /// Build an eraser service wired to this registry's infrastructure.
    pub fn make_eraser(&self) -> EraserService {
        EraserService::new(
            self.database.clone(),
            self.blobs.clone(),
            self.event_bus.clone(),
        )
    }

    /// Build a relay service wired to this registry's infrastructure.
    pub fn make_relay(&self, invite_url_base: &str) -> RelayService {
        RelayService::new(
            self.database.clone(),
            Arc::clone(&self.gateway),
            invite_url_base,
        )
    }

    /// Build a trigger router wired to this registry's infrastructure.
    pub fn make_router(&self, invite_url_base: &str) -> TriggerRouter {
        TriggerRouter::new(Arc::new(self.make_relay(invite_url_base)))
    }

    /// Initialize all registered services in order.
    pub async fn init_all(&self) -> TdResult<()> {
        info!("initializing {} services", self.services.len());

        for (name, service) in &self.services {
            info!("initializing service: {name}");
            let mut svc = service.write().await;
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(TdError::ServiceInit(format!("{name}: {e}")));
            }
        }

        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order.
    pub async fn shutdown_all(&self) -> TdResult<()> {
        info!("shutting down services");

        for (name, service) in self.services.iter().rev() {
            info!("shutting down service: {name}");
            let mut svc = service.write().await;
            if let Err(e) = svc.shutdown() {
                error!("error shutting down service {name}: {e}");
                // Continue shutting down other services
            }
        }

        info!("all services shut down");
        Ok(())
    }

    /// Get a reference to the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Get the health status of all services.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut results = Vec::new();
        for (name, service) in &self.services {
            let svc = service.read().await;
            results.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        results
    }

    /// Get the number of registered services.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use td_core::config::{AppConfig, DatabaseConfig};
    use td_core::error::TdResult;
    use td_push::PushMessage;

    struct NullGateway;

    #[async_trait]
    impl PushGateway for NullGateway {
        async fn send(&self, _message: &PushMessage) -> TdResult<()> {
            Ok(())
        }
    }

    fn test_registry() -> (ServiceRegistry, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default()).unwrap();
        let blobs = BlobStore::open(&dir.path().join("storage")).unwrap();
        let config = ConfigHandle::new(AppConfig::default());
        let registry = ServiceRegistry::new(config, db, blobs, Arc::new(NullGateway));
        (registry, dir)
    }

    #[test]
    fn test_service_state_display() {
        assert_eq!(ServiceState::Running.to_string(), "running");
        assert_eq!(ServiceState::Failed.to_string(), "failed");
    }

    #[tokio::test]
    async fn test_register_all() {
        let (mut registry, _dir) = test_registry();
        registry.register_all("https://tickdose.app/invite");
        assert_eq!(registry.service_count(), 3);
    }

    #[tokio::test]
    async fn test_init_and_shutdown() {
        let (mut registry, _dir) = test_registry();
        registry.register_all("https://tickdose.app/invite");

        registry.init_all().await.unwrap();

        let health = registry.health_check().await;
        for (name, state, healthy) in &health {
            assert!(healthy, "service {name} is not healthy (state: {state})");
        }

        registry.shutdown_all().await.unwrap();
    }
}
