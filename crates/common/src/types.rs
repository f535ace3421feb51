use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a marathon listing.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// marathon IDs with registration IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarathonId(Uuid);

impl MarathonId {
    /// Creates a new random marathon ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a marathon ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MarathonId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MarathonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MarathonId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MarathonId> for Uuid {
    fn from(id: MarathonId) -> Self {
        id.0
    }
}

/// Unique identifier for a registration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random registration ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a registration ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RegistrationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RegistrationId> for Uuid {
    fn from(id: RegistrationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marathon_id_new_creates_unique_ids() {
        let id1 = MarathonId::new();
        let id2 = MarathonId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn marathon_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = MarathonId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn ids_serialize_as_plain_uuid_strings() {
        let id = MarathonId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn registration_id_serialization_roundtrip() {
        let id = RegistrationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RegistrationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
