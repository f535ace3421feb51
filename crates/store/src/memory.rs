use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    FieldPatch, Marathon, MarathonFilter, MarathonId, NewMarathon, NewRegistration, Registration,
    RegistrationFilter, RegistrationId, Result, SortOrder,
    store::{MarathonStore, RegistrationStore},
};

/// In-memory store implementation for tests and local runs.
///
/// Holds both collections and provides the same interface as the
/// PostgreSQL implementation. Each map operation holds the collection
/// lock for the duration of that single operation only, so the two-step
/// coordinator protocols are exactly as non-atomic as they are in SQL.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    marathons: Arc<RwLock<HashMap<Uuid, Marathon>>>,
    registrations: Arc<RwLock<HashMap<Uuid, Registration>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored marathons.
    pub async fn marathon_count(&self) -> usize {
        self.marathons.read().await.len()
    }

    /// Returns the number of stored registrations.
    pub async fn registration_count(&self) -> usize {
        self.registrations.read().await.len()
    }

    /// Clears both collections.
    pub async fn clear(&self) {
        self.marathons.write().await.clear();
        self.registrations.write().await.clear();
    }
}

#[async_trait]
impl MarathonStore for InMemoryStore {
    async fn list_marathons(&self, filter: MarathonFilter) -> Result<Vec<Marathon>> {
        let store = self.marathons.read().await;
        let mut marathons: Vec<_> = store
            .values()
            .filter(|m| {
                filter
                    .creator_email
                    .as_deref()
                    .is_none_or(|email| m.creator_email == email)
            })
            .cloned()
            .collect();

        // Tie-break on id so equal timestamps still order deterministically
        marathons.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        if filter.sort == SortOrder::Descending {
            marathons.reverse();
        }

        if let Some(limit) = filter.limit {
            marathons.truncate(limit);
        }
        Ok(marathons)
    }

    async fn get_marathon(&self, id: MarathonId) -> Result<Option<Marathon>> {
        let store = self.marathons.read().await;
        Ok(store.get(&id.as_uuid()).cloned())
    }

    async fn insert_marathon(&self, new: NewMarathon) -> Result<MarathonId> {
        let new = new.sanitized();
        let id = MarathonId::new();
        let marathon = Marathon {
            id,
            creator_email: new.creator_email,
            created_at: Utc::now(),
            total_registration_count: 0,
            fields: new.fields,
        };
        self.marathons.write().await.insert(id.as_uuid(), marathon);
        Ok(id)
    }

    async fn update_marathon_fields(&self, id: MarathonId, patch: FieldPatch) -> Result<u64> {
        let mut store = self.marathons.write().await;
        match store.get(&id.as_uuid()) {
            Some(existing) => {
                let merged = existing.merged_with(&patch)?;
                store.insert(id.as_uuid(), merged);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_marathon(&self, id: MarathonId) -> Result<u64> {
        let mut store = self.marathons.write().await;
        Ok(u64::from(store.remove(&id.as_uuid()).is_some()))
    }

    async fn adjust_registration_count(&self, id: MarathonId, delta: i64) -> Result<u64> {
        let mut store = self.marathons.write().await;
        match store.get_mut(&id.as_uuid()) {
            Some(marathon) => {
                marathon.total_registration_count += delta;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn set_registration_count(&self, id: MarathonId, value: i64) -> Result<u64> {
        let mut store = self.marathons.write().await;
        match store.get_mut(&id.as_uuid()) {
            Some(marathon) => {
                marathon.total_registration_count = value;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn list_registrations(&self, filter: RegistrationFilter) -> Result<Vec<Registration>> {
        let search = filter.title_search.as_deref().map(str::to_lowercase);
        let store = self.registrations.read().await;
        let registrations: Vec<_> = store
            .values()
            .filter(|r| {
                filter
                    .email
                    .as_deref()
                    .is_none_or(|email| r.email == email)
                    && search
                        .as_deref()
                        .is_none_or(|term| r.marathon_title.to_lowercase().contains(term))
            })
            .cloned()
            .collect();
        Ok(registrations)
    }

    async fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>> {
        let store = self.registrations.read().await;
        Ok(store.get(&id.as_uuid()).cloned())
    }

    async fn insert_registration(&self, new: NewRegistration) -> Result<RegistrationId> {
        let new = new.sanitized();
        let id = RegistrationId::new();
        let registration = Registration {
            id,
            marathon_id: new.marathon_id,
            email: new.email,
            marathon_title: new.marathon_title,
            fields: new.fields,
        };
        self.registrations
            .write()
            .await
            .insert(id.as_uuid(), registration);
        Ok(id)
    }

    async fn update_registration_fields(
        &self,
        id: RegistrationId,
        patch: FieldPatch,
    ) -> Result<u64> {
        let mut store = self.registrations.write().await;
        match store.get(&id.as_uuid()) {
            Some(existing) => {
                let merged = existing.merged_with(&patch)?;
                store.insert(id.as_uuid(), merged);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_registration(&self, id: RegistrationId) -> Result<u64> {
        let mut store = self.registrations.write().await;
        Ok(u64::from(store.remove(&id.as_uuid()).is_some()))
    }

    async fn count_for_marathon(&self, marathon_id: MarathonId) -> Result<u64> {
        let store = self.registrations.read().await;
        Ok(store
            .values()
            .filter(|r| r.marathon_id == marathon_id)
            .count() as u64)
    }
}
