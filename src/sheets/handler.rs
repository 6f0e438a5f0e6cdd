//! Single-use response handlers
//!
//! Every load mints a uniquely named handler and holds it in a
//! [`PendingHandler`] guard. The guard is the only way to accept a payload and
//! it unregisters the name when dropped, so a response that shows up after the
//! load gave up (timeout, cancellation) has nothing left to invoke.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::gviz::unwrap_callback;
use crate::error::Result;

const HANDLER_PREFIX: &str = "sheetCallback_";

#[derive(Debug, Default)]
struct Inner {
    active: Mutex<HashSet<String>>,
    minted: AtomicU64,
    released: AtomicU64,
}

/// Set of handler names belonging to in-flight loads
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Inner>,
}

/// Lifetime counters, mostly useful to check that nothing leaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStats {
    pub minted: u64,
    pub released: u64,
    pub active: usize,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mint a fresh handler name and register it
    pub fn register(&self) -> PendingHandler {
        let mut active = self.active();
        let name = loop {
            let candidate = format!("{}{}", HANDLER_PREFIX, Uuid::new_v4().simple());
            if !active.contains(&candidate) {
                break candidate;
            }
        };
        active.insert(name.clone());
        self.inner.minted.fetch_add(1, Ordering::SeqCst);
        log::debug!("Registered sheet handler {}", name);

        PendingHandler {
            name,
            registry: self.clone(),
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active().contains(name)
    }

    pub fn stats(&self) -> HandlerStats {
        HandlerStats {
            minted: self.inner.minted.load(Ordering::SeqCst),
            released: self.inner.released.load(Ordering::SeqCst),
            active: self.active().len(),
        }
    }

    fn release(&self, name: &str) {
        if self.active().remove(name) {
            self.inner.released.fetch_add(1, Ordering::SeqCst);
            log::debug!("Released sheet handler {}", name);
        }
    }
}

/// Registered handler owned by exactly one load
#[derive(Debug)]
pub struct PendingHandler {
    name: String,
    registry: HandlerRegistry,
}

impl PendingHandler {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accept a wrapped response addressed to this handler.
    ///
    /// Consumes the guard, so a handler can be invoked at most once.
    pub fn deliver(self, body: &str) -> Result<serde_json::Value> {
        let json = unwrap_callback(body, &self.name)?;
        Ok(serde_json::from_str(json)?)
    }
}

impl Drop for PendingHandler {
    fn drop(&mut self) {
        self.registry.release(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    #[test]
    fn names_are_unique_and_prefixed() {
        let registry = HandlerRegistry::new();
        let a = registry.register();
        let b = registry.register();

        assert!(a.name().starts_with(HANDLER_PREFIX));
        assert_ne!(a.name(), b.name());
        assert_eq!(registry.stats().active, 2);
    }

    #[test]
    fn drop_releases_exactly_once() {
        let registry = HandlerRegistry::new();
        let pending = registry.register();
        let name = pending.name().to_string();
        assert!(registry.is_active(&name));

        drop(pending);

        assert!(!registry.is_active(&name));
        assert_eq!(
            registry.stats(),
            HandlerStats {
                minted: 1,
                released: 1,
                active: 0
            }
        );
    }

    #[test]
    fn deliver_consumes_and_releases() {
        let registry = HandlerRegistry::new();
        let pending = registry.register();
        let body = format!("{}({{\"table\":{{\"rows\":[]}}}});", pending.name());

        let value = pending.deliver(&body).unwrap();

        assert!(value["table"]["rows"].is_array());
        assert_eq!(registry.stats().active, 0);
        assert_eq!(registry.stats().released, 1);
    }

    #[test]
    fn deliver_rejects_foreign_handler() {
        let registry = HandlerRegistry::new();
        let pending = registry.register();

        let err = pending
            .deliver("sheetCallback_other({\"table\":{\"rows\":[]}});")
            .unwrap_err();

        assert!(matches!(err, LoadError::Format(_)));
        assert_eq!(registry.stats().active, 0);
    }
}
