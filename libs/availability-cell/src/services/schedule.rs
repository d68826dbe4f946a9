// libs/availability-cell/src/services/schedule.rs
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    validate_window, CreateScheduleRequest, DayOfWeek, RecurringScheduleEntry, ScheduleError,
    UpdateScheduleRequest,
};
use crate::store::{ScheduleStore, UserDirectory};

/// Entry point for doctor schedule maintenance. Every write is validated here
/// so expansion never sees an inverted window, an unknown weekday or a user
/// who is not a doctor.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    users: Arc<dyn UserDirectory>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    async fn require_doctor(&self, doctor_id: Uuid) -> Result<(), ScheduleError> {
        let user = self
            .users
            .find_user(doctor_id)
            .await?
            .ok_or(ScheduleError::DoctorNotFound)?;

        if !user.is_doctor() {
            return Err(ScheduleError::NotADoctor);
        }
        Ok(())
    }

    pub async fn create_schedule(
        &self,
        doctor_id: Uuid,
        request: CreateScheduleRequest,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        debug!("Creating schedule for doctor: {}", doctor_id);

        let day_of_week: DayOfWeek = request.day_of_week.parse()?;
        let entry = RecurringScheduleEntry::new(
            doctor_id,
            day_of_week,
            request.start_time,
            request.end_time,
        )?;
        self.require_doctor(doctor_id).await?;

        let created = self.store.insert_schedule(entry).await?;
        info!(
            "Schedule {} created for doctor {} on {} {}-{}",
            created.id, doctor_id, created.day_of_week, created.start_time, created.end_time
        );

        Ok(created)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        debug!("Updating schedule: {}", schedule_id);

        let mut entry = self.get_schedule(schedule_id).await?;

        if let Some(day) = request.day_of_week {
            entry.day_of_week = day.parse()?;
        }
        if let Some(start_time) = request.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            entry.end_time = end_time;
        }

        validate_window(entry.start_time, entry.end_time)?;

        self.store.update_schedule(entry).await
    }

    pub async fn get_schedule(&self, schedule_id: Uuid) -> Result<RecurringScheduleEntry, ScheduleError> {
        self.store
            .get_schedule(schedule_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound)
    }

    pub async fn list_doctor_schedules(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<RecurringScheduleEntry>, ScheduleError> {
        self.store.list_doctor_schedules(doctor_id).await
    }

    /// Removing a schedule only stops future generation; slots that were
    /// already generated stay in place.
    pub async fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), ScheduleError> {
        debug!("Deleting schedule: {}", schedule_id);

        if !self.store.delete_schedule(schedule_id).await? {
            return Err(ScheduleError::ScheduleNotFound);
        }
        Ok(())
    }
}
