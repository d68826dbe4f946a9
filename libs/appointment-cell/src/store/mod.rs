// libs/appointment-cell/src/store/mod.rs
use async_trait::async_trait;
use uuid::Uuid;

use shared_models::user::ClinicUser;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryClinicStore;
pub use supabase::SupabaseBookingStore;

/// Appointment persistence. Both write operations are single atomic units:
/// a caller never observes a claimed slot without its appointment, or a
/// cancelled appointment whose slot is still booked.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, AppointmentError>;

    /// Claims `slot_id` (which must belong to `doctor_id`) and inserts a
    /// pending appointment copying the slot's date and times.
    ///
    /// `SlotAlreadyBooked` when the claim loses, `SlotNotFound` when there is
    /// no such slot for this doctor.
    async fn book_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Appointment, AppointmentError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Compare-and-set on the status. Returns `None` when the appointment is
    /// missing or no longer in `from`. Moving to `Cancelled` releases the slot
    /// in the same unit.
    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError>;

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;
}
