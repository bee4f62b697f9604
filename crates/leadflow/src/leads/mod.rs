//! Lead lifecycle pipeline: intake, scoring, routing, lifecycle
//! bookkeeping, serialized storage, and the console HTTP surface.

pub mod domain;
pub mod lifecycle;
pub mod router;
pub mod routing;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    ActivityNote, Attribution, ContactInfo, DerivedFields, LeadId, LeadPatch, LeadRecord,
    LeadStatus, LeadSubmission, Priority,
};
pub use router::{lead_router, LeadApi, ListLeadsQuery, SubmitLeadRequest};
pub use routing::RoutingTable;
pub use scoring::{priority_from_score, score, ScoreInput};
pub use service::{LeadListing, LeadService, LeadServiceError, ListingMeta, PermissionView};
pub use store::{InMemoryLeadStore, LeadFilter, LeadStore, StoreError};
