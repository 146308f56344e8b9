//! In-memory management server.

use crate::management::{
    domain::{ManagedObject, ObjectName},
    ports::{ManagementError, ManagementResult, ManagementServer},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Thread-safe management server that keeps a snapshot of each object's
/// attributes taken at registration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManagementServer {
    objects: Arc<RwLock<BTreeMap<ObjectName, Value>>>,
}

impl InMemoryManagementServer {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attributes recorded for `name`.
    #[must_use]
    pub fn attributes(&self, name: &ObjectName) -> Option<Value> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns every registered name in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<ObjectName> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl ManagementServer for InMemoryManagementServer {
    fn register(&self, object: ManagedObject, name: &ObjectName) -> ManagementResult<()> {
        let attributes = object
            .attributes()
            .ok_or_else(|| ManagementError::NotCompliant {
                name: name.clone(),
                reason: format!("{} exposes no management attributes", object.kind()),
            })?;

        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        if objects.contains_key(name) {
            return Err(ManagementError::AlreadyRegistered(name.clone()));
        }
        objects.insert(name.clone(), attributes);
        debug!(object = %name, kind = object.kind(), "management object registered");
        Ok(())
    }

    fn unregister(&self, name: &ObjectName) -> ManagementResult<()> {
        let removed = self
            .objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_none() {
            return Err(ManagementError::NotRegistered(name.clone()));
        }
        debug!(object = %name, "management object unregistered");
        Ok(())
    }

    fn is_registered(&self, name: &ObjectName) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
