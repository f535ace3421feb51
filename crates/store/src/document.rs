//! Document types for the two persisted collections.
//!
//! Marathon and registration records carry a handful of typed fields the
//! backend actually reads, plus an opaque bag of descriptive fields
//! (title, dates, location, ...) that pass through unchanged.

use chrono::{DateTime, Utc};
use common::{MarathonId, RegistrationId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial update: top-level JSON fields to overwrite on a document.
pub type FieldPatch = Map<String, Value>;

/// Fields on a marathon document that a field patch may never touch.
/// The counter is owned by the registration coordinator.
pub const MARATHON_PROTECTED_FIELDS: &[&str] = &["id", "createdAt", "totalRegistrationCount"];

/// Fields on a registration document that a field patch may never touch.
/// `marathonId` is immutable after insert so the counters stay attributable.
pub const REGISTRATION_PROTECTED_FIELDS: &[&str] = &["id", "marathonId"];

/// Marathon fields stored in typed string columns. Non-string patch values
/// for these are dropped rather than rejected, in both backends.
const MARATHON_STRING_FIELDS: &[&str] = &["creatorEmail"];

/// Registration fields stored in typed string columns.
const REGISTRATION_STRING_FIELDS: &[&str] = &["email", "marathonTitle"];

/// A marathon event listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marathon {
    /// Store-generated identifier, immutable.
    pub id: MarathonId,
    /// Email of the user who created the listing.
    pub creator_email: String,
    /// Set at creation, used for sort ordering.
    pub created_at: DateTime<Utc>,
    /// Number of live registrations referencing this marathon,
    /// maintained best-effort by the registration coordinator.
    pub total_registration_count: i64,
    /// Opaque descriptive fields, passed through unchanged.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Marathon {
    /// Returns a copy with the patch applied as a top-level field merge.
    /// Protected fields in the patch are ignored.
    pub fn merged_with(&self, patch: &FieldPatch) -> Result<Self, serde_json::Error> {
        merge_document(
            self,
            patch,
            MARATHON_PROTECTED_FIELDS,
            MARATHON_STRING_FIELDS,
        )
    }
}

/// A marathon submission as received from the client. The store assigns
/// the id and creation timestamp; the counter starts at zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarathon {
    #[serde(default)]
    pub creator_email: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NewMarathon {
    /// Drops protected keys a client may have echoed into the submission.
    /// A `totalRegistrationCount` (or `id`, `createdAt`) left in the field
    /// bag would shadow the store-owned value in every response.
    pub fn sanitized(mut self) -> Self {
        for key in MARATHON_PROTECTED_FIELDS {
            self.fields.remove(*key);
        }
        self
    }
}

/// A user's signup for a specific marathon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Store-generated identifier, immutable.
    pub id: RegistrationId,
    /// Reference to the marathon; no cascade is enforced by the store.
    pub marathon_id: MarathonId,
    /// Registrant identity, used for ownership filtering.
    pub email: String,
    /// Denormalized copy of the marathon title, used for text search.
    pub marathon_title: String,
    /// Opaque descriptive fields, passed through unchanged.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Registration {
    /// Returns a copy with the patch applied as a top-level field merge.
    /// Protected fields in the patch are ignored.
    pub fn merged_with(&self, patch: &FieldPatch) -> Result<Self, serde_json::Error> {
        merge_document(
            self,
            patch,
            REGISTRATION_PROTECTED_FIELDS,
            REGISTRATION_STRING_FIELDS,
        )
    }
}

/// A registration submission. `marathonId` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub marathon_id: MarathonId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub marathon_title: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NewRegistration {
    /// Drops protected keys a client may have echoed into the submission.
    pub fn sanitized(mut self) -> Self {
        for key in REGISTRATION_PROTECTED_FIELDS {
            self.fields.remove(*key);
        }
        self
    }
}

fn merge_document<T: Serialize + serde::de::DeserializeOwned>(
    doc: &T,
    patch: &FieldPatch,
    protected: &[&str],
    string_fields: &[&str],
) -> Result<T, serde_json::Error> {
    let mut value = serde_json::to_value(doc)?;
    if let Value::Object(ref mut obj) = value {
        for (key, field) in patch {
            if protected.contains(&key.as_str()) {
                continue;
            }
            if string_fields.contains(&key.as_str()) && !field.is_string() {
                continue;
            }
            obj.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value)
}

/// Sort direction for marathon listings, keyed on `createdAt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses the `sort` query parameter: `desc` selects descending,
    /// anything else (or absence) selects ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

/// Filter for marathon listings.
#[derive(Debug, Clone, Default)]
pub struct MarathonFilter {
    /// Restrict to marathons created by this email.
    pub creator_email: Option<String>,
    /// Sort on `createdAt`.
    pub sort: SortOrder,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl MarathonFilter {
    /// Creates an unrestricted filter (ascending, no limit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a creator email.
    pub fn by_creator(mut self, email: impl Into<String>) -> Self {
        self.creator_email = Some(email.into());
        self
    }

    /// Sets the sort direction.
    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Caps the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filter for registration listings.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    /// Restrict to registrations owned by this email.
    pub email: Option<String>,
    /// Case-insensitive substring match on the marathon title.
    pub title_search: Option<String>,
}

impl RegistrationFilter {
    /// Creates an unrestricted filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a registrant email.
    pub fn by_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Adds a title substring search term.
    pub fn with_title_search(mut self, term: impl Into<String>) -> Self {
        self.title_search = Some(term.into());
        self
    }
}
