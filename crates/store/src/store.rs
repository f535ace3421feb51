use async_trait::async_trait;

use crate::{
    FieldPatch, Marathon, MarathonFilter, MarathonId, NewMarathon, NewRegistration, Registration,
    RegistrationFilter, RegistrationId, Result,
};

/// Persisted collection of marathon event listings.
///
/// All implementations must be thread-safe (Send + Sync). Update and delete
/// report how many documents they matched; callers derive NotFound from a
/// zero count rather than from a separate existence read.
#[async_trait]
pub trait MarathonStore: Send + Sync {
    /// Lists marathons matching the filter, ordered by creation time.
    async fn list_marathons(&self, filter: MarathonFilter) -> Result<Vec<Marathon>>;

    /// Fetches a single marathon by id.
    async fn get_marathon(&self, id: MarathonId) -> Result<Option<Marathon>>;

    /// Inserts a new marathon, assigning its id and creation timestamp.
    /// The registration counter starts at zero.
    async fn insert_marathon(&self, new: NewMarathon) -> Result<MarathonId>;

    /// Applies a field-level merge: only supplied fields are overwritten,
    /// protected fields are ignored. Returns the matched document count.
    async fn update_marathon_fields(&self, id: MarathonId, patch: FieldPatch) -> Result<u64>;

    /// Deletes a marathon by id. Returns the removed count; deleting an
    /// absent id is not an error.
    async fn delete_marathon(&self, id: MarathonId) -> Result<u64>;

    /// Adds `delta` to the marathon's registration counter as a single
    /// field-level operation. Returns the matched document count, which is
    /// zero when the marathon no longer exists.
    async fn adjust_registration_count(&self, id: MarathonId, delta: i64) -> Result<u64>;

    /// Overwrites the registration counter with an absolute value.
    /// Used by counter reconciliation. Returns the matched count.
    async fn set_registration_count(&self, id: MarathonId, value: i64) -> Result<u64>;
}

/// Persisted collection of registration records.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Lists registrations matching the filter.
    async fn list_registrations(&self, filter: RegistrationFilter) -> Result<Vec<Registration>>;

    /// Fetches a single registration by id.
    async fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>>;

    /// Inserts a new registration, assigning its id. Does NOT touch the
    /// marathon counter; that is the registration coordinator's job.
    async fn insert_registration(&self, new: NewRegistration) -> Result<RegistrationId>;

    /// Applies a field-level merge. Returns the matched document count.
    async fn update_registration_fields(
        &self,
        id: RegistrationId,
        patch: FieldPatch,
    ) -> Result<u64>;

    /// Deletes a registration by id. Returns the removed count.
    async fn delete_registration(&self, id: RegistrationId) -> Result<u64>;

    /// Counts live registrations referencing a marathon.
    /// Used by counter reconciliation.
    async fn count_for_marathon(&self, marathon_id: MarathonId) -> Result<u64>;
}
