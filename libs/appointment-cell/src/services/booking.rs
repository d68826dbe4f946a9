// libs/appointment-cell/src/services/booking.rs
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::{AvailableSlot, SlotStore};
use shared_models::user::ClinicUser;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, CreateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::BookingStore;

/// Allocates slots to patients and drives appointments through their
/// lifecycle. Every store call is bounded by `store_timeout`; nothing is
/// retried here.
pub struct BookingCoordinator {
    slots: Arc<dyn SlotStore>,
    bookings: Arc<dyn BookingStore>,
    lifecycle: AppointmentLifecycleService,
    store_timeout: Duration,
}

impl BookingCoordinator {
    pub fn new(slots: Arc<dyn SlotStore>, bookings: Arc<dyn BookingStore>, store_timeout: Duration) -> Self {
        Self {
            slots,
            bookings,
            lifecycle: AppointmentLifecycleService::new(),
            store_timeout,
        }
    }

    async fn bounded<T, E, F>(&self, operation: &str, call: F) -> Result<T, AppointmentError>
    where
        F: Future<Output = Result<T, E>>,
        AppointmentError: From<E>,
    {
        match timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(AppointmentError::from),
            Err(_) => {
                warn!("Store call '{}' timed out after {:?}", operation, self.store_timeout);
                Err(AppointmentError::Timeout(operation.to_string()))
            }
        }
    }

    async fn require_doctor(&self, doctor_id: Uuid) -> Result<ClinicUser, AppointmentError> {
        let doctor = self
            .bounded("get_user", self.bookings.get_user(doctor_id))
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if !doctor.is_doctor() {
            return Err(AppointmentError::NotADoctor);
        }
        Ok(doctor)
    }

    /// Unbooked slots for a doctor on or after `from`, ordered by date then
    /// start time.
    #[instrument(skip(self))]
    pub async fn list_available_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, AppointmentError> {
        self.require_doctor(doctor_id).await?;

        let slots = self
            .bounded("list_open_slots", self.slots.list_open_slots(doctor_id, from))
            .await?;
        debug!("Doctor {} has {} open slots from {}", doctor_id, slots.len(), from);

        Ok(slots)
    }

    /// Marks a slot as taken without creating an appointment.
    #[instrument(skip(self))]
    pub async fn claim_slot(&self, slot_id: Uuid) -> Result<AvailableSlot, AppointmentError> {
        let slot = self.bounded("claim_slot", self.slots.claim_slot(slot_id)).await?;
        info!("Slot {} claimed", slot_id);
        Ok(slot)
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, patient_id = %request.patient_id))]
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.start_time >= request.end_time {
            return Err(AppointmentError::ValidationError(format!(
                "Start time {} must be before end time {}",
                request.start_time, request.end_time
            )));
        }

        self.require_doctor(request.doctor_id).await?;
        self.bounded("get_user", self.bookings.get_user(request.patient_id))
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        let slot = self
            .bounded(
                "find_slot",
                self.slots
                    .find_slot(request.doctor_id, request.appointment_date, request.start_time),
            )
            .await?
            .ok_or(AppointmentError::SlotNotFound)?;

        if slot.end_time != request.end_time {
            return Err(AppointmentError::ValidationError(format!(
                "Slot starting at {} ends at {}, not {}",
                slot.start_time, slot.end_time, request.end_time
            )));
        }

        let appointment = self
            .bounded(
                "book_slot",
                self.bookings
                    .book_slot(slot.id, request.doctor_id, request.patient_id),
            )
            .await?;

        info!(
            "Appointment {} booked on {} {}-{} (slot {})",
            appointment.id,
            appointment.appointment_date,
            appointment.start_time,
            appointment.end_time,
            appointment.slot_id
        );
        Ok(appointment)
    }

    /// Applies one lifecycle step. The write only lands if the appointment is
    /// still in the status that was validated; otherwise `ConcurrentModification`.
    #[instrument(skip(self))]
    pub async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;

        self.lifecycle
            .validate_status_transition(current.status, new_status)?;

        let updated = self
            .bounded(
                "update_status",
                self.bookings
                    .update_status(appointment_id, current.status, new_status),
            )
            .await?
            .ok_or(AppointmentError::ConcurrentModification)?;

        info!(
            "Appointment {} moved from {} to {}",
            appointment_id, current.status, updated.status
        );
        Ok(updated)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.bounded("get_appointment", self.bookings.get_appointment(appointment_id))
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.require_doctor(doctor_id).await?;
        self.bounded(
            "list_doctor_appointments",
            self.bookings.list_doctor_appointments(doctor_id),
        )
        .await
    }

    pub async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.bounded("get_user", self.bookings.get_user(patient_id))
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;
        self.bounded(
            "list_patient_appointments",
            self.bookings.list_patient_appointments(patient_id),
        )
        .await
    }
}
