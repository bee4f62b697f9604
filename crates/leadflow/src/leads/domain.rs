use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Identifier wrapper for captured leads.
///
/// Identifiers are human readable and sortable by creation date:
/// `LD-<YYYYMMDD>-<6 hex chars>`. The random suffix is collision-checked
/// against the store at creation time and an identifier is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        LeadId(format!(
            "LD-{}-{}",
            created_at.format("%Y%m%d"),
            suffix[..6].to_uppercase()
        ))
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical lead lifecycle vocabulary.
///
/// Every ingress point (API payloads and stored data alike) deserializes
/// through [`LeadStatus::normalize`], so downstream code only ever sees
/// these five values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    New,
    InProgress,
    Quoted,
    Won,
    Lost,
}

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::InProgress => "IN_PROGRESS",
            LeadStatus::Quoted => "QUOTED",
            LeadStatus::Won => "WON",
            LeadStatus::Lost => "LOST",
        }
    }

    /// Strict parser for the status vocabulary, including the legacy
    /// labels still emitted by older console builds and imported data.
    /// Unknown labels are `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "NEW" => Some(LeadStatus::New),
            "IN_PROGRESS" | "CONTACTED" | "QUALIFIED" => Some(LeadStatus::InProgress),
            "QUOTED" | "NEGOTIATION" | "PROPOSAL" => Some(LeadStatus::Quoted),
            "WON" | "CLOSED" | "CLOSED_WON" => Some(LeadStatus::Won),
            "LOST" | "CLOSED_LOST" | "DROPPED" => Some(LeadStatus::Lost),
            _ => None,
        }
    }

    /// Total normalizer used when reading record data: anything
    /// [`LeadStatus::parse`] does not recognize lands on `New` so
    /// imported or legacy data always stays visible.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(LeadStatus::New)
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LeadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LeadStatus::normalize(&raw))
    }
}

/// Priority tier derived from the numeric score at creation time.
/// Operators may override it later; overrides are never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Hot,
    Warm,
    Cold,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::Hot => "HOT",
            Priority::Warm => "WARM",
            Priority::Cold => "COLD",
        }
    }
}

/// Free-form attribution captured from the submitting page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub page_path: Option<String>,
}

/// Contact details for the person behind the lead. At least one of
/// email/phone must be present for a submission to be accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn has_channel(&self) -> bool {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .map(|raw| !raw.trim().is_empty())
                .unwrap_or(false)
        };
        filled(&self.email) || filled(&self.phone)
    }
}

/// Raw intake payload for a new lead, prior to scoring and routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub plan: Option<String>,
    /// Requirement size. Units depend on the category (seats, endpoints,
    /// sites); scoring only relies on the magnitude.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attribution: Attribution,
    #[serde(default)]
    pub contact: ContactInfo,
}

fn default_quantity() -> u32 {
    1
}

/// A single operator-authored note on a lead. Notes are append-only and
/// stored newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNote {
    pub author: String,
    pub body: String,
    pub at: DateTime<Utc>,
}

/// Fields derived by the scoring engine and assignment router before the
/// record is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    pub score: u8,
    pub priority: Priority,
    pub assigned_to: Option<String>,
}

/// The central sales record. Owned exclusively by the lead store; all
/// mutation flows through its serialized API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub plan: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attribution: Attribution,
    #[serde(default)]
    pub contact: ContactInfo,
    pub status: LeadStatus,
    pub priority: Priority,
    pub score: u8,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub first_contact_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_contact_by: Option<String>,
    #[serde(default)]
    pub last_contacted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_follow_up_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity: Vec<ActivityNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn new(
        id: LeadId,
        submission: LeadSubmission,
        derived: DerivedFields,
        now: DateTime<Utc>,
    ) -> Self {
        LeadRecord {
            id,
            brand: submission.brand,
            category: submission.category,
            plan: submission.plan,
            quantity: submission.quantity,
            city: submission.city,
            timeline: submission.timeline,
            notes: submission.notes,
            attribution: submission.attribution,
            contact: submission.contact,
            status: LeadStatus::New,
            priority: derived.priority,
            score: derived.score,
            assigned_to: derived.assigned_to,
            first_contact_at: None,
            first_contact_by: None,
            last_contacted_at: None,
            next_follow_up_at: None,
            activity: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Constrained partial update applied through the store's serialization
/// point. Absent fields leave the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default, alias = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(default, alias = "nextFollowUpAt")]
    pub next_follow_up_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, alias = "markContacted")]
    pub mark_contacted: bool,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.score.is_none()
            && self.assigned_to.is_none()
            && self.next_follow_up_at.is_none()
            && self.note.is_none()
            && !self.mark_contacted
    }
}
