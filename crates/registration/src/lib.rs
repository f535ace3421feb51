//! Registration lifecycle coordination.
//!
//! The coordinator is the only component allowed to mutate a marathon's
//! registration counter. Its create and delete protocols span two
//! independently persisted collections without a transaction; the
//! reconciler repairs the counter drift that design tolerates.

pub mod coordinator;
pub mod error;
pub mod reconcile;

pub use coordinator::RegistrationCoordinator;
pub use error::{RegistrationError, Result};
pub use reconcile::CounterReconciler;
