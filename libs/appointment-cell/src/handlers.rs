// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{CreateAppointmentRequest, TransitionRequest};
use crate::services::BookingCoordinator;

pub struct AppointmentState {
    pub coordinator: BookingCoordinator,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    /// Defaults to today (UTC).
    pub from: Option<NaiveDate>,
}

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());
    let slots = state.coordinator.list_available_slots(doctor_id, from).await?;

    Ok(Json(json!({
        "available_slots": slots,
        "doctor_id": doctor_id,
        "from": from,
        "total_slots": slots.len()
    })))
}

/// Marks a slot booked without creating an appointment. Nothing in the API
/// releases such a slot: it stays booked, and hidden from listings, until an
/// operator clears `is_booked` in storage. Patients should book through
/// `POST /appointments` instead, which cancellation can undo.
#[axum::debug_handler]
pub async fn claim_slot(
    State(state): State<Arc<AppointmentState>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slot = state.coordinator.claim_slot(slot_id).await?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.coordinator.create_appointment(request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.coordinator.get_appointment(appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .coordinator
        .transition_appointment(appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.coordinator.list_doctor_appointments(doctor_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.coordinator.list_patient_appointments(patient_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}
