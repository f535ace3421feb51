pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{MarathonId, RegistrationId};
pub use document::{
    FieldPatch, Marathon, MarathonFilter, NewMarathon, NewRegistration, Registration,
    RegistrationFilter, SortOrder,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{MarathonStore, RegistrationStore};
