// libs/appointment-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};
use shared_models::user::ClinicUser;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::store::BookingStore;

/// Booking store backed by PostgREST. Both atomic units run inside the
/// `book_appointment_slot` / `transition_appointment_status` SQL functions.
pub struct SupabaseBookingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn list_appointments(&self, column: &str, id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?{}=eq.{}&order=appointment_date.asc,start_time.asc",
            column, id
        );
        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to list appointments", e))
    }
}

fn db_error(context: &str, error: anyhow::Error) -> AppointmentError {
    error!("{}: {}", context, error);
    AppointmentError::DatabaseError(format!("{}: {}", context, error))
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, AppointmentError> {
        let path = format!("/rest/v1/users?id=eq.{}&select=id,role", user_id);
        let rows: Vec<ClinicUser> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to fetch user", e))?;

        Ok(rows.into_iter().next())
    }

    async fn book_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let result: anyhow::Result<Vec<Appointment>> = self
            .supabase
            .rpc(
                "book_appointment_slot",
                json!({
                    "p_slot_id": slot_id,
                    "p_doctor_id": doctor_id,
                    "p_patient_id": patient_id,
                }),
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                return Err(match e.downcast_ref::<SupabaseError>() {
                    Some(api) if api.is_conflict() => {
                        debug!("Slot {} lost the claim: {}", slot_id, api.message);
                        AppointmentError::SlotAlreadyBooked
                    }
                    Some(api) if api.is_not_found() => AppointmentError::SlotNotFound,
                    _ => db_error("Failed to book slot", e),
                });
            }
        };

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Booking returned no appointment".to_string()))
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to fetch appointment", e))?;

        Ok(rows.into_iter().next())
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let rows: Vec<Appointment> = self
            .supabase
            .rpc(
                "transition_appointment_status",
                json!({
                    "p_appointment_id": appointment_id,
                    "p_from": from.to_string(),
                    "p_to": to.to_string(),
                }),
            )
            .await
            .map_err(|e| db_error("Failed to update appointment status", e))?;

        Ok(rows.into_iter().next())
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_appointments("doctor_id", doctor_id).await
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_appointments("patient_id", patient_id).await
    }
}
