// libs/availability-cell/src/store/mod.rs
use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_models::user::ClinicUser;

use crate::models::{
    AvailableSlot, DateRange, Holiday, RecurringScheduleEntry, ScheduleError, SlotCandidate,
};

pub mod supabase;

pub use supabase::SupabaseAvailabilityStore;

/// Source of recurring weekly availability.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_schedules(&self) -> Result<Vec<RecurringScheduleEntry>, ScheduleError>;

    async fn list_doctor_schedules(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<RecurringScheduleEntry>, ScheduleError>;

    async fn get_schedule(&self, schedule_id: Uuid) -> Result<Option<RecurringScheduleEntry>, ScheduleError>;

    async fn insert_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError>;

    /// Replaces the entry with the same id. `ScheduleNotFound` if it is gone.
    async fn update_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError>;

    /// Returns whether a row was removed.
    async fn delete_schedule(&self, schedule_id: Uuid) -> Result<bool, ScheduleError>;
}

/// Lookup into the externally managed users table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, ScheduleError>;
}

#[async_trait]
pub trait HolidayCalendar: Send + Sync {
    async fn holidays_between(&self, range: &DateRange) -> Result<BTreeSet<NaiveDate>, ScheduleError>;

    /// Upsert keyed on the date.
    async fn add_holiday(&self, holiday: Holiday) -> Result<Holiday, ScheduleError>;
}

/// Persistence for generated slots.
///
/// Implementations must keep `(doctor_id, slot_date, start_time)` unique and
/// must never modify an existing row from `insert_slots_if_absent`.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Inserts the candidates whose key is not stored yet and returns how many
    /// rows were actually created.
    async fn insert_slots_if_absent(&self, slots: &[SlotCandidate]) -> Result<usize, ScheduleError>;

    /// Unbooked slots on or after `from`, ordered by date then start time.
    async fn list_open_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, ScheduleError>;

    async fn find_slot(
        &self,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<AvailableSlot>, ScheduleError>;

    /// Atomically flips `is_booked` from false to true.
    ///
    /// `SlotAlreadyBooked` when the flag was already set, `SlotNotFound` when
    /// no slot has this id.
    async fn claim_slot(&self, slot_id: Uuid) -> Result<AvailableSlot, ScheduleError>;
}
