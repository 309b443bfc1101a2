pub mod clinic;
pub mod store;

pub use clinic::{ClinicDatastore, ClinicTables};
pub use store::{Datastore, Record, StoreError, Table};
