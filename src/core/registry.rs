//! Registry of open logger names
//!
//! At most one open logger holds a given name. The registry is an explicit
//! object shared through `Arc`; loggers built without one are standalone and
//! take part in no name checks.

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happens when a logger is built under a name that is already held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Close the current holder, free the name and fail the new construction
    #[default]
    CloseExisting,
    /// Fail the new construction and leave the current holder alone
    Reject,
    /// Close the current holder and hand the name to the new logger
    Replace,
}

/// Shared flag telling a holder it has been closed from outside
#[derive(Debug, Default)]
struct Lease {
    evicted: AtomicBool,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Arc<Lease>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Claim `name` for a new logger
    pub(crate) fn acquire(
        self: &Arc<Self>,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<Membership> {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(name).cloned() {
            match policy {
                CollisionPolicy::Reject => return Err(LoggerError::already_exists(name)),
                CollisionPolicy::CloseExisting => {
                    existing.evicted.store(true, Ordering::Release);
                    entries.remove(name);
                    eprintln!(
                        "[LOGGER WARNING] Logger('{}') closed by a conflicting construction",
                        name
                    );
                    return Err(LoggerError::already_exists(name));
                }
                CollisionPolicy::Replace => {
                    existing.evicted.store(true, Ordering::Release);
                    eprintln!("[LOGGER WARNING] Logger('{}') replaced by a new holder", name);
                }
            }
        }

        let lease = Arc::new(Lease::default());
        entries.insert(name.to_string(), Arc::clone(&lease));

        Ok(Membership {
            registry: Arc::clone(self),
            name: name.to_string(),
            lease,
        })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// A logger's hold on its name
#[derive(Debug)]
pub(crate) struct Membership {
    registry: Arc<Registry>,
    name: String,
    lease: Arc<Lease>,
}

impl Membership {
    /// True once another construction has closed this holder
    pub(crate) fn is_evicted(&self) -> bool {
        self.lease.evicted.load(Ordering::Acquire)
    }

    /// Give the name back, unless it already belongs to someone else
    pub(crate) fn release(self) {
        let mut entries = self.registry.entries.lock();
        if entries
            .get(&self.name)
            .is_some_and(|current| Arc::ptr_eq(current, &self.lease))
        {
            entries.remove(&self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let registry = Registry::shared();
        let membership = registry.acquire("app", CollisionPolicy::Reject).unwrap();
        assert!(registry.is_registered("app"));

        membership.release();
        assert!(!registry.is_registered("app"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reject_leaves_holder() {
        let registry = Registry::shared();
        let first = registry.acquire("app", CollisionPolicy::Reject).unwrap();

        let err = registry.acquire("app", CollisionPolicy::Reject).unwrap_err();
        assert!(matches!(err, LoggerError::AlreadyExists { .. }));
        assert!(!first.is_evicted());
        assert!(registry.is_registered("app"));
    }

    #[test]
    fn test_close_existing_frees_name() {
        let registry = Registry::shared();
        let first = registry.acquire("app", CollisionPolicy::Reject).unwrap();

        assert!(registry.acquire("app", CollisionPolicy::CloseExisting).is_err());
        assert!(first.is_evicted());
        assert!(!registry.is_registered("app"));

        // The evicted holder releasing late must not touch a new holder
        let second = registry.acquire("app", CollisionPolicy::Reject).unwrap();
        first.release();
        assert!(registry.is_registered("app"));
        second.release();
    }

    #[test]
    fn test_replace_hands_over() {
        let registry = Registry::shared();
        let first = registry.acquire("app", CollisionPolicy::Reject).unwrap();
        let second = registry.acquire("app", CollisionPolicy::Replace).unwrap();

        assert!(first.is_evicted());
        assert!(!second.is_evicted());
        first.release();
        assert_eq!(registry.names(), vec!["app".to_string()]);
    }
}
