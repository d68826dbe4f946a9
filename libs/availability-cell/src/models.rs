// libs/availability-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::{AppError, ErrorKind};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ==============================================================================
// RECURRING SCHEDULE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ScheduleError;

    /// Accepts full English names or three-letter abbreviations, any case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            _ => Err(ScheduleError::ValidationError(format!(
                "Unknown day of week: '{}'",
                value
            ))),
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// One weekly availability window for a doctor, e.g. every Monday 09:00-12:00.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringScheduleEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl RecurringScheduleEntry {
    /// Builds a new entry, rejecting windows where `end_time <= start_time`.
    pub fn new(
        doctor_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, ScheduleError> {
        validate_window(start_time, end_time)?;
        Ok(Self {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week,
            start_time,
            end_time,
        })
    }
}

pub fn validate_window(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), ScheduleError> {
    if start_time >= end_time {
        return Err(ScheduleError::ValidationError(format!(
            "Start time {} must be before end time {}",
            start_time, end_time
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub day_of_week: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A concrete, bookable interval. Unique on `(doctor_id, slot_date, start_time)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableSlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

impl AvailableSlot {
    pub fn from_candidate(candidate: &SlotCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id: candidate.doctor_id,
            slot_date: candidate.slot_date,
            start_time: candidate.start_time,
            end_time: candidate.end_time,
            is_booked: false,
        }
    }

    pub fn key(&self) -> SlotKey {
        (self.doctor_id, self.slot_date, self.start_time)
    }
}

pub type SlotKey = (Uuid, NaiveDate, NaiveTime);

/// Expansion output: a slot that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotCandidate {
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SlotCandidate {
    pub fn key(&self) -> SlotKey {
        (self.doctor_id, self.slot_date, self.start_time)
    }
}

/// Fixed slot length used to slice availability windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGranularity {
    minutes: u32,
}

impl SlotGranularity {
    pub fn from_minutes(minutes: u32) -> Result<Self, ScheduleError> {
        if minutes == 0 || minutes > MINUTES_PER_DAY {
            return Err(ScheduleError::ValidationError(format!(
                "Slot granularity must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY, minutes
            )));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }
}

impl Default for SlotGranularity {
    fn default() -> Self {
        Self { minutes: 30 }
    }
}

// ==============================================================================
// CALENDAR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Inclusive date range; `start <= end` is guaranteed by construction.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScheduleError> {
        if start > end {
            return Err(ScheduleError::ValidationError(format!(
                "Range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// `[today, today + days]`.
    pub fn horizon(today: NaiveDate, days: u32) -> Result<Self, ScheduleError> {
        let end = today
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                ScheduleError::ValidationError(format!("Horizon of {} days overflows the calendar", days))
            })?;
        Self::new(today, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days after `start`, so a single-day range spans 0.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity_minutes: Option<u32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Schedule not found")]
    ScheduleNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("User is not a doctor")]
    NotADoctor,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot is already booked")]
    SlotAlreadyBooked,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::ValidationError(_) | ScheduleError::NotADoctor => ErrorKind::Validation,
            ScheduleError::ScheduleNotFound
            | ScheduleError::DoctorNotFound
            | ScheduleError::SlotNotFound => ErrorKind::NotFound,
            ScheduleError::SlotAlreadyBooked => ErrorKind::Conflict,
            ScheduleError::DatabaseError(_) => ErrorKind::Internal,
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(error: ScheduleError) -> Self {
        AppError::from_kind(error.kind(), error.to_string())
    }
}
