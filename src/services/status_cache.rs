//! Status id to display name cache
//!
//! Shared via `Arc<StatusNameCache>` across handlers. Entries expire after a
//! TTL and are dropped explicitly when a status is renamed or deleted, so a
//! long-running worker never shows a stale name for longer than one TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::db::{StatusFilter, StatusStore, Store};
use crate::tenancy::TenantId;
use crate::types::NEW_STATUS;

/// Display name of the built-in status
pub const NEW_STATUS_NAME: &str = "New";

pub struct StatusNameCache {
    entries: Mutex<HashMap<(TenantId, Uuid), (String, Instant)>>,
    ttl: Duration,
}

impl StatusNameCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, tenant_id: TenantId, id: Uuid) -> Option<String> {
        self.get_at(tenant_id, id, Instant::now())
    }

    fn get_at(&self, tenant_id: TenantId, id: Uuid, now: Instant) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(&(tenant_id, id)) {
            Some((name, stored)) if now.duration_since(*stored) < self.ttl => Some(name.clone()),
            Some(_) => {
                entries.remove(&(tenant_id, id));
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, tenant_id: TenantId, id: Uuid, name: impl Into<String>) {
        self.insert_at(tenant_id, id, name.into(), Instant::now());
    }

    /// Inserting also sweeps expired entries, so ids that are never looked
    /// up again do not pile up.
    fn insert_at(&self, tenant_id: TenantId, id: Uuid, name: String, now: Instant) {
        let mut entries = self.entries.lock();
        entries.retain(|_, (_, stored)| now.duration_since(*stored) < self.ttl);
        entries.insert((tenant_id, id), (name, now));
    }

    /// Drop one status. Called on rename and delete.
    pub fn invalidate(&self, tenant_id: TenantId, id: Uuid) {
        self.entries.lock().remove(&(tenant_id, id));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display name for a stored status value.
    ///
    /// The built-in status never hits the store. Unknown ids, non-id values
    /// and lookup failures fall back to the raw value.
    pub async fn resolve_name(&self, store: &dyn Store, tenant_id: TenantId, status: &str) -> String {
        if status.eq_ignore_ascii_case(NEW_STATUS) {
            return NEW_STATUS_NAME.to_string();
        }

        let Ok(id) = Uuid::parse_str(status) else {
            return status.to_string();
        };

        if let Some(name) = self.get(tenant_id, id) {
            return name;
        }

        match store.find_status(&StatusFilter::by_id_for_tenant(tenant_id, id)).await {
            Ok(Some(found)) => {
                self.insert(tenant_id, id, found.name.clone());
                found.name
            }
            Ok(None) => status.to_string(),
            Err(e) => {
                warn!("Status name lookup failed for {}: {}", id, e);
                status.to_string()
            }
        }
    }
}
