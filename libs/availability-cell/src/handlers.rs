use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    CreateScheduleRequest, DateRange, GenerateSlotsRequest, Holiday, SlotGranularity,
    UpdateScheduleRequest,
};
use crate::services::{HorizonScheduler, ScheduleService};
use crate::store::HolidayCalendar;

/// Shared state for the schedule routes.
pub struct AvailabilityState {
    pub schedules: ScheduleService,
    pub horizon: Arc<HorizonScheduler>,
    pub holidays: Arc<dyn HolidayCalendar>,
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AvailabilityState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule = state.schedules.create_schedule(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule,
        "message": "Schedule created successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_schedules(
    State(state): State<Arc<AvailabilityState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedules = state.schedules.list_doctor_schedules(doctor_id).await?;

    Ok(Json(json!({
        "schedules": schedules,
        "doctor_id": doctor_id,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AvailabilityState>>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedule = state.schedules.get_schedule(schedule_id).await?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AvailabilityState>>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule = state.schedules.update_schedule(schedule_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule,
        "message": "Schedule updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AvailabilityState>>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.schedules.delete_schedule(schedule_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule deleted successfully"
    })))
}

// ==============================================================================
// CALENDAR & GENERATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_holiday(
    State(state): State<Arc<AvailabilityState>>,
    Json(holiday): Json<Holiday>,
) -> Result<Json<Value>, AppError> {
    let holiday = state.holidays.add_holiday(holiday).await?;
    info!("Holiday registered for {}", holiday.date);

    Ok(Json(json!({
        "success": true,
        "holiday": holiday
    })))
}

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AvailabilityState>>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let range = DateRange::new(request.start_date, request.end_date)?;
    let max_span = state.horizon.config().max_manual_span_days();
    if range.span_days() > i64::from(max_span) {
        return Err(AppError::ValidationError(format!(
            "Range {} to {} exceeds the {} day generation limit",
            range.start(),
            range.end(),
            max_span
        )));
    }

    let granularity = match request.granularity_minutes {
        Some(minutes) => SlotGranularity::from_minutes(minutes)?,
        None => state.horizon.config().granularity,
    };

    let report = state.horizon.generate_for_range(range, granularity).await?;

    Ok(Json(json!({
        "success": report.is_complete(),
        "report": report
    })))
}
