//! Gate registry for path and host based webhook routing.
//!
//! [`GateRegistry`] associates gate names with their [`GateHandler`]s. It is
//! built once at startup and used read-only during request handling.
//!
//! # URL Structure
//!
//! Each registered gate is reachable at:
//! ```text
//! POST /{gate}/webhook
//! ```
//!
//! The shared `POST /webhook` endpoint picks a gate by matching the request
//! host against each gate's `domains` list, in registration order.

use crate::config::GatewayConfig;
use std::sync::Arc;
use witness_gate_core::{AuditHook, ContentStore, GateHandler, GateIdentity};

/// Ordered collection of gate handlers
///
/// Registration order is the order host inference tries gates in, so it must
/// follow configuration order.
#[derive(Clone, Default)]
pub struct GateRegistry {
    handlers: Vec<Arc<GateHandler>>,
}

impl GateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one handler per configured gate, sharing the store and hooks
    pub fn from_gateway(
        config: &GatewayConfig,
        store: Option<Arc<dyn ContentStore>>,
        hooks: &[Arc<dyn AuditHook>],
    ) -> Self {
        let mut registry = Self::new();
        for identity in &config.gates {
            let mut handler =
                GateHandler::new(identity.clone()).with_store_timeout(config.store_timeout());
            if let Some(store) = &store {
                handler = handler.with_store(Arc::clone(store));
            }
            for hook in hooks {
                handler = handler.with_hook(Arc::clone(hook));
            }
            registry.register(Arc::new(handler));
        }
        registry
    }

    /// Register a gate handler.
    ///
    /// A handler whose gate name is already registered replaces the existing
    /// one in place, keeping its position.
    pub fn register(&mut self, handler: Arc<GateHandler>) -> &mut Self {
        let name = handler.identity().name.clone();
        match self
            .handlers
            .iter_mut()
            .find(|existing| existing.identity().name == name)
        {
            Some(slot) => *slot = handler,
            None => self.handlers.push(handler),
        }
        self
    }

    /// Look up a handler by exact gate name
    pub fn get(&self, name: &str) -> Option<Arc<GateHandler>> {
        self.handlers
            .iter()
            .find(|h| h.identity().name.as_str() == name)
            .cloned()
    }

    /// First gate, in registration order, whose domains match `host`
    pub fn infer_from_host(&self, host: &str) -> Option<Arc<GateHandler>> {
        if host.is_empty() {
            return None;
        }
        self.handlers
            .iter()
            .find(|h| h.identity().matches_host(host))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Identities in registration order
    pub fn identities(&self) -> impl Iterator<Item = &GateIdentity> {
        self.handlers.iter().map(|h| h.identity())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for GateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.identities().map(|i| i.name.as_str()).collect();
        f.debug_struct("GateRegistry").field("gates", &names).finish()
    }
}

#[cfg(test)]
#[path = "gate_registry_tests.rs"]
mod tests;
