//! Counter reconciliation.
//!
//! The create/delete protocols tolerate counter drift; this job recomputes
//! every marathon's counter from the live registration count and rewrites
//! the ones that diverged. Registrations referencing a deleted marathon are
//! left in place: reconciliation repairs counters, it does not garbage
//! collect orphans.

use store::{MarathonFilter, MarathonStore, RegistrationStore};

use crate::error::Result;

/// Recomputes marathon registration counters from the registration store.
pub struct CounterReconciler<S> {
    store: S,
}

impl<S> CounterReconciler<S>
where
    S: MarathonStore + RegistrationStore,
{
    /// Creates a reconciler over the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs one reconciliation pass. Returns the number of counters repaired.
    ///
    /// A marathon deleted mid-pass makes its counter write match zero rows;
    /// that is counted as nothing to repair.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<u64> {
        let marathons = self.store.list_marathons(MarathonFilter::new()).await?;
        let mut repaired = 0;

        for marathon in marathons {
            let live = self.store.count_for_marathon(marathon.id).await? as i64;
            if live == marathon.total_registration_count {
                continue;
            }

            let matched = self.store.set_registration_count(marathon.id, live).await?;
            if matched > 0 {
                repaired += 1;
                metrics::counter!("registration_counters_reconciled_total").increment(1);
                tracing::info!(
                    marathon_id = %marathon.id,
                    stored = marathon.total_registration_count,
                    live,
                    "repaired drifted registration counter"
                );
            }
        }

        tracing::debug!(repaired, "reconciliation pass complete");
        Ok(repaired)
    }
}
