pub mod consultation;
pub mod lifecycle;

pub use consultation::ConsultationService;
pub use lifecycle::EncounterLifecycleService;
