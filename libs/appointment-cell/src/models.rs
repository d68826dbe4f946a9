// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use availability_cell::ScheduleError;
use shared_models::error::{AppError, ErrorKind};

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub slot_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approved,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("User is not a doctor")]
    NotADoctor,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot is already booked")]
    SlotAlreadyBooked,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment was modified concurrently")]
    ConcurrentModification,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store timed out: {0}")]
    Timeout(String),
}

impl AppointmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::SlotNotFound => ErrorKind::NotFound,
            AppointmentError::NotADoctor | AppointmentError::ValidationError(_) => {
                ErrorKind::Validation
            }
            AppointmentError::SlotAlreadyBooked | AppointmentError::ConcurrentModification => {
                ErrorKind::Conflict
            }
            AppointmentError::InvalidStatusTransition { .. } => ErrorKind::InvalidTransition,
            AppointmentError::DatabaseError(_) | AppointmentError::Timeout(_) => ErrorKind::Internal,
        }
    }
}

impl From<ScheduleError> for AppointmentError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::SlotNotFound => AppointmentError::SlotNotFound,
            ScheduleError::DoctorNotFound => AppointmentError::DoctorNotFound,
            ScheduleError::NotADoctor => AppointmentError::NotADoctor,
            ScheduleError::SlotAlreadyBooked => AppointmentError::SlotAlreadyBooked,
            ScheduleError::DatabaseError(message) => AppointmentError::DatabaseError(message),
            ScheduleError::ValidationError(message) => AppointmentError::ValidationError(message),
            ScheduleError::ScheduleNotFound => {
                AppointmentError::ValidationError(ScheduleError::ScheduleNotFound.to_string())
            }
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        AppError::from_kind(error.kind(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&AppointmentStatus::Approved).unwrap(), "\"approved\"");
        assert_eq!(
            serde_json::from_str::<AppointmentStatus>("\"cancelled\"").unwrap(),
            AppointmentStatus::Cancelled
        );
        assert!(serde_json::from_str::<AppointmentStatus>("\"confirmed\"").is_err());
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Pending);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppointmentError::NotADoctor.kind(), ErrorKind::Validation);
        assert_eq!(AppointmentError::SlotAlreadyBooked.kind(), ErrorKind::Conflict);
        assert_eq!(AppointmentError::ConcurrentModification.kind(), ErrorKind::Conflict);
        assert_eq!(AppointmentError::Timeout("claim".into()).kind(), ErrorKind::Internal);
        assert_eq!(
            AppointmentError::InvalidStatusTransition {
                from: AppointmentStatus::Pending,
                to: AppointmentStatus::Completed,
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
    }

    #[test]
    fn test_schedule_errors_keep_their_class() {
        assert_eq!(
            AppointmentError::from(ScheduleError::SlotAlreadyBooked),
            AppointmentError::SlotAlreadyBooked
        );
        assert_eq!(
            AppointmentError::from(ScheduleError::SlotNotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppointmentError::from(ScheduleError::DatabaseError("down".into())).kind(),
            ErrorKind::Internal
        );
    }
}
