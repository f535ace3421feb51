//! Coordinator for the two-step registration write protocols.

use common::RegistrationId;
use store::{MarathonStore, NewRegistration, RegistrationStore};

use crate::error::{RegistrationError, Result};

/// Keeps a marathon's registration counter synchronized with registration
/// creates and deletes.
///
/// The two steps of each protocol hit two independently persisted
/// collections and are NOT atomic with respect to each other. The
/// registration row is always written first and is the source of truth;
/// the counter update is best-effort, and a miss (marathon gone, crash
/// between steps) leaves drift for [`crate::CounterReconciler`] to repair.
pub struct RegistrationCoordinator<S> {
    store: S,
}

impl<S> RegistrationCoordinator<S>
where
    S: MarathonStore + RegistrationStore,
{
    /// Creates a coordinator over the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a registration and increments the referenced marathon's
    /// counter by exactly one.
    ///
    /// The insert must succeed for the operation to succeed. The increment
    /// matching zero marathons is tolerated: the registration is kept as an
    /// orphan and the drift is logged, never surfaced to the caller. An
    /// unexpected store fault during the increment propagates as a failure
    /// without rolling back the insert.
    #[tracing::instrument(skip(self, submission), fields(marathon_id = %submission.marathon_id))]
    pub async fn create_registration(
        &self,
        submission: NewRegistration,
    ) -> Result<RegistrationId> {
        let marathon_id = submission.marathon_id;

        let id = self.store.insert_registration(submission).await?;
        metrics::counter!("registrations_created_total").increment(1);

        let matched = self.store.adjust_registration_count(marathon_id, 1).await?;
        if matched == 0 {
            metrics::counter!("registration_counter_drift_total").increment(1);
            tracing::warn!(
                %marathon_id,
                registration_id = %id,
                "counter increment matched no marathon, registration left orphaned"
            );
        }

        Ok(id)
    }

    /// Deletes a registration and decrements the referenced marathon's
    /// counter by exactly one.
    ///
    /// The marathon reference is read before the delete because the id alone
    /// is not enough once the row is gone. Decrementing before deleting is
    /// ruled out: a dangling registration is discoverable later, an
    /// unaccounted decrement is not. Any decrement failure after a
    /// successful delete is tolerated and logged.
    #[tracing::instrument(skip(self))]
    pub async fn delete_registration(&self, id: RegistrationId) -> Result<()> {
        let registration = self
            .store
            .get_registration(id)
            .await?
            .ok_or(RegistrationError::NotFound(id))?;

        let removed = self.store.delete_registration(id).await?;
        if removed == 0 {
            return Err(RegistrationError::DeleteRace(id));
        }
        metrics::counter!("registrations_deleted_total").increment(1);

        match self
            .store
            .adjust_registration_count(registration.marathon_id, -1)
            .await
        {
            Ok(0) => {
                metrics::counter!("registration_counter_drift_total").increment(1);
                tracing::warn!(
                    marathon_id = %registration.marathon_id,
                    registration_id = %id,
                    "counter decrement matched no marathon"
                );
            }
            Ok(_) => {}
            Err(error) => {
                metrics::counter!("registration_counter_drift_total").increment(1);
                tracing::warn!(
                    marathon_id = %registration.marathon_id,
                    registration_id = %id,
                    %error,
                    "counter decrement failed after successful delete"
                );
            }
        }

        Ok(())
    }
}
