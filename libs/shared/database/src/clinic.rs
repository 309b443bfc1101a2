use uuid::Uuid;

use shared_models::{Booking, Encounter, Slot};

use crate::store::{Datastore, Record, Table};

/// The single shared relational state: one table per persisted entity.
#[derive(Debug, Clone, Default)]
pub struct ClinicTables {
    pub slots: Table<Slot>,
    pub bookings: Table<Booking>,
    pub encounters: Table<Encounter>,
}

impl Record for Slot {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Booking {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Encounter {
    fn id(&self) -> Uuid {
        self.id
    }
}

pub type ClinicDatastore = Datastore<ClinicTables>;
