use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::DoctorProfile;

/// Read-only lookup into the doctor/specialty directory. Only the booking
/// list operations consult it; booking logic itself never does.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// Returns the directory entry for `doctor_id`, or `None` when the
    /// directory has no record of the doctor.
    async fn doctor_profile(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>>;
}
