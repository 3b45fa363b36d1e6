//! Gateway state
//!
//! Application state for the gateway server.

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionManager;
use folio_common::AppConfig;
use folio_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Service context; its bridge does the per-project fan-out
    service_context: Arc<ServiceContext>,
    connection_manager: Arc<ConnectionManager>,
    /// Redis listener; absent when no Redis is configured
    event_dispatcher: Option<Arc<EventDispatcher>>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        connection_manager: Arc<ConnectionManager>,
        event_dispatcher: Option<Arc<EventDispatcher>>,
        config: AppConfig,
    ) -> Self {
        Self {
            service_context,
            connection_manager,
            event_dispatcher,
            config: Arc::new(config),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn event_dispatcher(&self) -> Option<&EventDispatcher> {
        self.event_dispatcher.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("event_dispatcher", &self.event_dispatcher)
            .field("env", &self.config.app.env)
            .finish()
    }
}
