use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::mechanism::{MechanismHandler, PlainMechanism, RegistryError};
use crate::protocol::Symbol;

/// Mechanism name to handler. Built before a connection starts I/O and
/// read-only afterwards; clones share the handlers.
#[derive(Clone, Default)]
pub struct MechanismRegistry {
    handlers: HashMap<Symbol, Arc<dyn MechanismHandler>>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name. A later registration for the
    /// same name replaces the earlier one.
    pub fn register<H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        H: MechanismHandler + 'static,
    {
        self.register_shared(Arc::new(handler))
    }

    pub fn register_shared(&mut self, handler: Arc<dyn MechanismHandler>) -> Result<(), RegistryError> {
        let name = handler.name();
        if name.as_str().is_empty() || !name.is_valid() {
            return Err(RegistryError::InvalidName(name.as_str().to_string()));
        }

        self.insert(name, handler);
        Ok(())
    }

    // PLAIN is always a valid name, so this skips the name check.
    pub fn with_plain(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let plain: Arc<dyn MechanismHandler> = Arc::new(PlainMechanism::new(username, password));
        self.insert(plain.name(), plain);
        self
    }

    fn insert(&mut self, name: Symbol, handler: Arc<dyn MechanismHandler>) {
        if self.handlers.insert(name.clone(), handler).is_some() {
            debug!(mechanism = %name, "replaced sasl mechanism handler");
        }
    }

    pub fn get(&self, name: &Symbol) -> Option<&Arc<dyn MechanismHandler>> {
        self.handlers.get(name)
    }

    /// First advertised name with a registered handler, in the broker's order.
    pub fn select(&self, advertised: &[Symbol]) -> Option<(Symbol, Arc<dyn MechanismHandler>)> {
        advertised
            .iter()
            .find_map(|name| self.handlers.get(name).map(|h| (name.clone(), Arc::clone(h))))
    }

    pub fn names(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for MechanismRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismRegistry")
            .field("mechanisms", &self.names())
            .finish()
    }
}
