//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It is
//! read-only after startup: config, the compiled route table, and the auth
//! backend client. Nothing here is mutated per request.

use std::sync::Arc;

use crate::access::RouteTable;
use crate::backend::AuthBackend;
use crate::config::GateConfig;

/// Clone is required by Axum; every field is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub routes: Arc<RouteTable>,
    pub backend: Arc<dyn AuthBackend>,
}

impl AppState {
    #[must_use]
    pub fn new(config: GateConfig, backend: Arc<dyn AuthBackend>) -> Self {
        let routes = Arc::new(RouteTable::from_lists(&config.routes));
        Self { config: Arc::new(config), routes, backend }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
