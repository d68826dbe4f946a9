// libs/availability-cell/src/store/supabase.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_models::user::ClinicUser;

use crate::models::{
    AvailableSlot, DateRange, Holiday, RecurringScheduleEntry, ScheduleError, SlotCandidate,
};
use crate::store::{HolidayCalendar, ScheduleStore, SlotStore, UserDirectory};

const SLOT_INSERT_BATCH: usize = 500;

/// PostgREST-backed implementation of the availability traits.
pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

fn db_error(context: &str, error: anyhow::Error) -> ScheduleError {
    error!("{}: {}", context, error);
    ScheduleError::DatabaseError(format!("{}: {}", context, error))
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn schedule_body(entry: &RecurringScheduleEntry) -> Value {
    json!({
        "id": entry.id,
        "doctor_id": entry.doctor_id,
        "day_of_week": entry.day_of_week.to_string(),
        "start_time": format_time(entry.start_time),
        "end_time": format_time(entry.end_time),
    })
}

#[async_trait]
impl UserDirectory for SupabaseAvailabilityStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, ScheduleError> {
        let path = format!("/rest/v1/users?id=eq.{}&select=id,role", user_id);
        let rows: Vec<ClinicUser> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to fetch user", e))?;

        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ScheduleStore for SupabaseAvailabilityStore {
    async fn list_schedules(&self) -> Result<Vec<RecurringScheduleEntry>, ScheduleError> {
        self.supabase
            .request(
                Method::GET,
                "/rest/v1/doctor_schedules?order=doctor_id.asc,start_time.asc",
                None,
            )
            .await
            .map_err(|e| db_error("Failed to list schedules", e))
    }

    async fn list_doctor_schedules(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<RecurringScheduleEntry>, ScheduleError> {
        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&order=start_time.asc",
            doctor_id
        );
        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to list doctor schedules", e))
    }

    async fn get_schedule(&self, schedule_id: Uuid) -> Result<Option<RecurringScheduleEntry>, ScheduleError> {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let rows: Vec<RecurringScheduleEntry> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to fetch schedule", e))?;

        Ok(rows.into_iter().next())
    }

    async fn insert_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        let rows: Vec<RecurringScheduleEntry> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_schedules",
                Some(schedule_body(&entry)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| db_error("Failed to create schedule", e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ScheduleError::DatabaseError("Failed to create schedule".to_string()))
    }

    async fn update_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", entry.id);
        let rows: Vec<RecurringScheduleEntry> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(schedule_body(&entry)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| db_error("Failed to update schedule", e))?;

        rows.into_iter().next().ok_or(ScheduleError::ScheduleNotFound)
    }

    async fn delete_schedule(&self, schedule_id: Uuid) -> Result<bool, ScheduleError> {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await
            .map_err(|e| db_error("Failed to delete schedule", e))?;

        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl HolidayCalendar for SupabaseAvailabilityStore {
    async fn holidays_between(&self, range: &DateRange) -> Result<BTreeSet<NaiveDate>, ScheduleError> {
        let path = format!(
            "/rest/v1/holidays?date=gte.{}&date=lte.{}",
            range.start(),
            range.end()
        );
        let rows: Vec<Holiday> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to list holidays", e))?;

        Ok(rows.into_iter().map(|holiday| holiday.date).collect())
    }

    async fn add_holiday(&self, holiday: Holiday) -> Result<Holiday, ScheduleError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let rows: Vec<Holiday> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/holidays?on_conflict=date",
                Some(json!({
                    "date": holiday.date,
                    "description": holiday.description,
                })),
                Some(headers),
            )
            .await
            .map_err(|e| db_error("Failed to add holiday", e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ScheduleError::DatabaseError("Failed to add holiday".to_string()))
    }
}

#[async_trait]
impl SlotStore for SupabaseAvailabilityStore {
    async fn insert_slots_if_absent(&self, slots: &[SlotCandidate]) -> Result<usize, ScheduleError> {
        let mut inserted = 0;

        for batch in slots.chunks(SLOT_INSERT_BATCH) {
            let body: Vec<Value> = batch
                .iter()
                .map(|slot| {
                    json!({
                        "doctor_id": slot.doctor_id,
                        "slot_date": slot.slot_date,
                        "start_time": format_time(slot.start_time),
                        "end_time": format_time(slot.end_time),
                        "is_booked": false,
                    })
                })
                .collect();

            // ignore-duplicates leaves existing rows (and their is_booked flag)
            // untouched and only echoes the rows that were created.
            let mut headers = HeaderMap::new();
            headers.insert(
                "Prefer",
                HeaderValue::from_static("resolution=ignore-duplicates,return=representation"),
            );

            let created: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/available_slots?on_conflict=doctor_id,slot_date,start_time",
                    Some(Value::Array(body)),
                    Some(headers),
                )
                .await
                .map_err(|e| db_error("Failed to insert slots", e))?;

            inserted += created.len();
        }

        debug!("Inserted {} of {} candidate slots", inserted, slots.len());
        Ok(inserted)
    }

    async fn list_open_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, ScheduleError> {
        let path = format!(
            "/rest/v1/available_slots?doctor_id=eq.{}&is_booked=eq.false&slot_date=gte.{}&order=slot_date.asc,start_time.asc",
            doctor_id, from
        );
        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to list available slots", e))
    }

    async fn find_slot(
        &self,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<AvailableSlot>, ScheduleError> {
        let path = format!(
            "/rest/v1/available_slots?doctor_id=eq.{}&slot_date=eq.{}&start_time=eq.{}",
            doctor_id,
            slot_date,
            format_time(start_time)
        );
        let rows: Vec<AvailableSlot> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| db_error("Failed to look up slot", e))?;

        Ok(rows.into_iter().next())
    }

    async fn claim_slot(&self, slot_id: Uuid) -> Result<AvailableSlot, ScheduleError> {
        // Conditional update: only matches while is_booked is still false.
        let path = format!("/rest/v1/available_slots?id=eq.{}&is_booked=eq.false", slot_id);
        let claimed: Vec<AvailableSlot> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "is_booked": true })),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| db_error("Failed to claim slot", e))?;

        if let Some(slot) = claimed.into_iter().next() {
            debug!("Claimed slot {}", slot_id);
            return Ok(slot);
        }

        // Nothing matched; tell "booked" apart from "missing".
        let lookup = format!("/rest/v1/available_slots?id=eq.{}&select=id", slot_id);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &lookup, None)
            .await
            .map_err(|e| db_error("Failed to look up slot", e))?;

        if existing.is_empty() {
            Err(ScheduleError::SlotNotFound)
        } else {
            Err(ScheduleError::SlotAlreadyBooked)
        }
    }
}
