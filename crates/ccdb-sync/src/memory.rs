//! In-memory [`Store`] with the same observable semantics as the PostgreSQL
//! store. Every operation holds one lock for its whole duration, which makes
//! each mutation atomic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ccdb_core::{
    validate_record_key, validate_stub_batch, ChildCare, County, Entity, ListingStub, Store,
    StoreError, UpsertCounts,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
struct Tables {
    counties: BTreeMap<String, County>,
    stubs: BTreeMap<String, ListingStub>,
    child_cares: BTreeMap<String, ChildCare>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_counties(counties: impl IntoIterator<Item = County>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.lock();
            for county in counties {
                tables.counties.insert(county.name.clone(), county);
            }
        }
        store
    }

    #[must_use]
    pub fn counties(&self) -> Vec<County> {
        self.lock().counties.values().cloned().collect()
    }

    /// All stubs ordered by external URL id, including those already promoted.
    #[must_use]
    pub fn stubs(&self) -> Vec<ListingStub> {
        self.lock().stubs.values().cloned().collect()
    }

    #[must_use]
    pub fn child_cares(&self) -> Vec<ChildCare> {
        self.lock().child_cares.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Mutations are computed before being applied, so poisoned tables are
        // still consistent.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn oldest_unrefreshed(&self) -> Result<Option<String>, StoreError> {
        let tables = self.lock();
        let child_cares = tables
            .child_cares
            .values()
            .map(|c| (c.selection_key(), &c.external_url_id));
        let stubs = tables
            .stubs
            .values()
            .filter(|s| !tables.child_cares.contains_key(&s.external_url_id))
            .map(|s| (s.selection_key(), &s.external_url_id));

        // Option orders None before Some, matching NULLS FIRST.
        Ok(child_cares.chain(stubs).min().map(|(_, id)| id.clone()))
    }

    async fn get_by_external_id(
        &self,
        external_url_id: &str,
    ) -> Result<Option<Entity>, StoreError> {
        let tables = self.lock();
        if let Some(child_care) = tables.child_cares.get(external_url_id) {
            return Ok(Some(Entity::ChildCare(child_care.clone())));
        }
        Ok(tables.stubs.get(external_url_id).cloned().map(Entity::Stub))
    }

    async fn upsert_stubs(
        &self,
        county: &County,
        batch: &[ListingStub],
    ) -> Result<UpsertCounts, StoreError> {
        validate_stub_batch(county, batch)?;

        let mut guard = self.lock();
        let tables = &mut *guard;
        if !batch.is_empty() && !tables.counties.contains_key(&county.name) {
            return Err(StoreError::UnknownCounty(county.name.clone()));
        }

        let mut counts = UpsertCounts::default();
        for stub in batch {
            match tables.stubs.get_mut(&stub.external_url_id) {
                Some(existing) => {
                    let last_checked_on = existing.last_checked_on;
                    *existing = ListingStub {
                        last_checked_on,
                        ..stub.clone()
                    };
                    counts.updated += 1;
                }
                None => {
                    tables
                        .stubs
                        .insert(stub.external_url_id.clone(), stub.clone());
                    counts.inserted += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn upsert_child_care(&self, child_care: &ChildCare) -> Result<(), StoreError> {
        validate_record_key(&child_care.external_url_id, &child_care.county)?;

        let mut tables = self.lock();
        if !tables.counties.contains_key(&child_care.county) {
            return Err(StoreError::UnknownCounty(child_care.county.clone()));
        }

        let merged = match tables.child_cares.get(&child_care.external_url_id) {
            Some(existing) => ChildCare {
                last_scraped_on: existing.last_scraped_on.max(child_care.last_scraped_on),
                last_checked_on: existing.last_checked_on.max(child_care.last_checked_on),
                latitude: existing.latitude,
                longitude: existing.longitude,
                last_geocoded_on: existing.last_geocoded_on,
                last_geocode_attempt_on: existing.last_geocode_attempt_on,
                ..child_care.clone()
            },
            None => child_care.clone(),
        };
        tables
            .child_cares
            .insert(merged.external_url_id.clone(), merged);
        Ok(())
    }

    async fn mark_checked(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let mut found = false;
        if let Some(child_care) = tables.child_cares.get_mut(external_url_id) {
            child_care.last_checked_on = child_care.last_checked_on.max(Some(at));
            found = true;
        }
        if let Some(stub) = tables.stubs.get_mut(external_url_id) {
            stub.last_checked_on = stub.last_checked_on.max(Some(at));
            found = true;
        }
        Ok(found)
    }

    async fn oldest_county(&self) -> Result<Option<County>, StoreError> {
        Ok(self
            .lock()
            .counties
            .values()
            .min_by(|a, b| (a.last_scraped_on, &a.name).cmp(&(b.last_scraped_on, &b.name)))
            .cloned())
    }

    async fn mark_county_scraped(&self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let county = tables
            .counties
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownCounty(name.to_string()))?;
        county.last_scraped_on = county.last_scraped_on.max(Some(at));
        Ok(())
    }

    async fn geocode_candidates(&self, limit: usize) -> Result<Vec<ChildCare>, StoreError> {
        let tables = self.lock();
        let mut candidates: Vec<&ChildCare> = tables
            .child_cares
            .values()
            .filter(|c| c.needs_geocode())
            .collect();
        candidates.sort_by(|a, b| {
            (a.last_geocode_attempt_on, &a.external_url_id)
                .cmp(&(b.last_geocode_attempt_on, &b.external_url_id))
        });
        Ok(candidates.into_iter().take(limit).cloned().collect())
    }

    async fn record_geocode(
        &self,
        external_url_id: &str,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let child_care = existing_child_care(&mut tables, external_url_id)?;
        child_care.latitude = Some(latitude);
        child_care.longitude = Some(longitude);
        child_care.last_geocoded_on = Some(at);
        child_care.last_geocode_attempt_on = child_care.last_geocode_attempt_on.max(Some(at));
        Ok(())
    }

    async fn record_geocode_failure(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let child_care = existing_child_care(&mut tables, external_url_id)?;
        child_care.last_geocode_attempt_on = child_care.last_geocode_attempt_on.max(Some(at));
        Ok(())
    }
}

fn existing_child_care<'t>(
    tables: &'t mut Tables,
    external_url_id: &str,
) -> Result<&'t mut ChildCare, StoreError> {
    tables
        .child_cares
        .get_mut(external_url_id)
        .ok_or_else(|| StoreError::InvalidRecord {
            external_url_id: external_url_id.to_string(),
            reason: "no child care with this id".to_string(),
        })
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
