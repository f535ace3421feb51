pub mod types;

pub use types::{MarathonId, RegistrationId};
