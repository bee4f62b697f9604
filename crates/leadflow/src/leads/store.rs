use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{DerivedFields, LeadId, LeadPatch, LeadRecord, LeadStatus, LeadSubmission};
use super::lifecycle;

/// Storage abstraction for lead records. The store is the single source
/// of truth and the only component allowed to mutate persisted leads.
///
/// Implementations must serialize every read-modify-write cycle: when two
/// operators patch the same lead concurrently, both changes land: the
/// second writer merges onto the first writer's committed state instead
/// of clobbering it.
pub trait LeadStore: Send + Sync {
    /// Validate, assign a fresh identifier, and persist a new lead.
    fn create(
        &self,
        submission: LeadSubmission,
        derived: DerivedFields,
        now: DateTime<Utc>,
    ) -> Result<LeadRecord, StoreError>;

    /// Fetch a record. A missing identifier is `Ok(None)`, never an error.
    fn get(&self, id: &LeadId) -> Result<Option<LeadRecord>, StoreError>;

    /// Apply a constrained partial update inside the serialization point
    /// and return the committed record. `updated_at` is always refreshed.
    fn patch(
        &self,
        id: &LeadId,
        patch: LeadPatch,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<LeadRecord, StoreError> {
        self.patch_if(id, patch, actor, now, &|_| true)
    }

    /// Like [`LeadStore::patch`], but the patch only applies when the
    /// guard accepts the record's current state. The guard runs inside
    /// the serialization point, so the state it inspects is exactly the
    /// state the patch lands on. A rejected guard reports `NotFound`.
    fn patch_if(
        &self,
        id: &LeadId,
        patch: LeadPatch,
        actor: &str,
        now: DateTime<Utc>,
        guard: &(dyn Fn(&LeadRecord) -> bool + Sync),
    ) -> Result<LeadRecord, StoreError>;

    /// Records matching the filter, newest-first by creation time.
    fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("lead not found")]
    NotFound,
    #[error("lead store unavailable: {0}")]
    Unavailable(String),
}

/// Listing predicates. All fields are conjunctive; unset fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub brand: Option<String>,
    pub status: Option<LeadStatus>,
    pub city: Option<String>,
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub assignee: Option<String>,
    pub query: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl LeadFilter {
    pub fn matches(&self, record: &LeadRecord) -> bool {
        if let Some(brand) = self.brand.as_deref() {
            if !record.brand.eq_ignore_ascii_case(brand) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(city) = self.city.as_deref() {
            let matched = record
                .city
                .as_deref()
                .map(|have| have.eq_ignore_ascii_case(city))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(source) = self.source.as_deref() {
            let matched = record
                .attribution
                .source
                .as_deref()
                .map(|have| have.eq_ignore_ascii_case(source))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(campaign) = self.campaign.as_deref() {
            let matched = record
                .attribution
                .campaign
                .as_deref()
                .map(|have| have.eq_ignore_ascii_case(campaign))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(assignee) = self.assignee.as_deref() {
            let matched = record
                .assigned_to
                .as_deref()
                .map(|have| have.eq_ignore_ascii_case(assignee))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if record.created_at > to {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref() {
            if !free_text_match(record, query) {
                return false;
            }
        }
        true
    }
}

fn free_text_match(record: &LeadRecord, query: &str) -> bool {
    let needle = query.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return true;
    }
    let mut haystacks: Vec<&str> = vec![&record.id.0, &record.brand, &record.category];
    for value in [
        record.contact.name.as_deref(),
        record.contact.company.as_deref(),
        record.contact.email.as_deref(),
        record.contact.phone.as_deref(),
        record.city.as_deref(),
        record.notes.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        haystacks.push(value);
    }
    haystacks
        .iter()
        .any(|haystack| haystack.to_ascii_lowercase().contains(&needle))
}

/// In-process store backed by a single mutex over the collection.
///
/// The mutex is the serialization point required by the store contract:
/// `create` and `patch` each hold it across their entire
/// read-modify-write cycle, so per-lead mutation order is exactly the
/// lock-acquisition order and no update is ever silently dropped.
/// Readers clone the last committed snapshot and never observe a
/// half-applied patch.
#[derive(Default, Clone)]
pub struct InMemoryLeadStore {
    leads: Arc<Mutex<HashMap<LeadId, LeadRecord>>>,
}

impl InMemoryLeadStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<LeadId, LeadRecord>>, StoreError> {
        self.leads
            .lock()
            .map_err(|_| StoreError::Unavailable("lead store mutex poisoned".to_string()))
    }
}

impl LeadStore for InMemoryLeadStore {
    fn create(
        &self,
        submission: LeadSubmission,
        derived: DerivedFields,
        now: DateTime<Utc>,
    ) -> Result<LeadRecord, StoreError> {
        if !submission.contact.has_channel() {
            return Err(StoreError::Validation(
                "at least one of email or phone is required".to_string(),
            ));
        }

        let mut guard = self.lock()?;
        let id = loop {
            let candidate = LeadId::generate(now);
            if !guard.contains_key(&candidate) {
                break candidate;
            }
        };

        let record = LeadRecord::new(id.clone(), submission, derived, now);
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: &LeadId) -> Result<Option<LeadRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn patch_if(
        &self,
        id: &LeadId,
        patch: LeadPatch,
        actor: &str,
        now: DateTime<Utc>,
        guard: &(dyn Fn(&LeadRecord) -> bool + Sync),
    ) -> Result<LeadRecord, StoreError> {
        let mut leads = self.lock()?;
        let record = leads.get_mut(id).ok_or(StoreError::NotFound)?;
        if !guard(record) {
            return Err(StoreError::NotFound);
        }
        lifecycle::apply_patch(record, &patch, actor, now);
        Ok(record.clone())
    }

    fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, StoreError> {
        let guard = self.lock()?;
        let mut records: Vec<LeadRecord> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.0.cmp(&a.id.0)));
        Ok(records)
    }
}
