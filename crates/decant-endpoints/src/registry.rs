//! Endpoint registry mapping each endpoint kind to its client

use std::collections::HashMap;
use std::sync::Arc;

use decant_core::{EndpointClient, EndpointKind};

/// Registry of available endpoint clients, keyed by kind
pub struct EndpointRegistry {
    clients: HashMap<EndpointKind, Arc<dyn EndpointClient>>,
}

impl EndpointRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Create a registry with all built-in endpoint clients registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "clickhouse")]
        registry.register(Arc::new(crate::clickhouse::ClickHouseEndpoint::new()));
        #[cfg(feature = "file")]
        registry.register(Arc::new(crate::file::DelimitedFileEndpoint::new()));

        registry
    }

    /// Register a client under its kind, replacing any previous one
    pub fn register(&mut self, client: Arc<dyn EndpointClient>) {
        let kind = client.kind();
        tracing::info!(kind = %kind, endpoint = client.name(), "registering endpoint client");
        self.clients.insert(kind, client);
    }

    /// Get the client for a kind
    pub fn get(&self, kind: EndpointKind) -> Option<Arc<dyn EndpointClient>> {
        let client = self.clients.get(&kind).cloned();
        if client.is_none() {
            tracing::warn!(kind = %kind, "no endpoint client registered for kind");
        }
        client
    }

    /// List all registered kinds
    pub fn list(&self) -> Vec<EndpointKind> {
        self.clients.keys().copied().collect()
    }

    /// Check if a kind has a registered client
    pub fn has(&self, kind: EndpointKind) -> bool {
        self.clients.contains_key(&kind)
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
