// libs/appointment-cell/src/store/memory.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use availability_cell::{
    AvailableSlot, DateRange, Holiday, HolidayCalendar, RecurringScheduleEntry, ScheduleError,
    ScheduleStore, SlotCandidate, SlotKey, SlotStore, UserDirectory,
};
use shared_models::user::ClinicUser;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::store::BookingStore;

#[derive(Default)]
struct ClinicState {
    users: HashMap<Uuid, ClinicUser>,
    schedules: BTreeMap<Uuid, RecurringScheduleEntry>,
    holidays: BTreeMap<NaiveDate, Holiday>,
    slots: HashMap<Uuid, AvailableSlot>,
    slot_index: BTreeMap<SlotKey, Uuid>,
    appointments: HashMap<Uuid, Appointment>,
}

impl ClinicState {
    fn sorted_appointments<F>(&self, filter: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|appointment| filter(appointment))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.appointment_date, a.start_time, a.created_at));
        appointments
    }
}

/// Process-local store implementing every repository trait. All state sits
/// behind one lock, so each atomic unit (claim, claim plus insert, status
/// change plus release) runs under a single write guard.
#[derive(Default)]
pub struct InMemoryClinicStore {
    state: RwLock<ClinicState>,
}

impl InMemoryClinicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: ClinicUser) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn get_slot(&self, slot_id: Uuid) -> Option<AvailableSlot> {
        self.state.read().await.slots.get(&slot_id).cloned()
    }
}

#[async_trait]
impl UserDirectory for InMemoryClinicStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, ScheduleError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryClinicStore {
    async fn list_schedules(&self) -> Result<Vec<RecurringScheduleEntry>, ScheduleError> {
        Ok(self.state.read().await.schedules.values().cloned().collect())
    }

    async fn list_doctor_schedules(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<RecurringScheduleEntry>, ScheduleError> {
        let state = self.state.read().await;
        let mut schedules: Vec<RecurringScheduleEntry> = state
            .schedules
            .values()
            .filter(|entry| entry.doctor_id == doctor_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|entry| (entry.day_of_week, entry.start_time));
        Ok(schedules)
    }

    async fn get_schedule(&self, schedule_id: Uuid) -> Result<Option<RecurringScheduleEntry>, ScheduleError> {
        Ok(self.state.read().await.schedules.get(&schedule_id).cloned())
    }

    async fn insert_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        self.state.write().await.schedules.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update_schedule(
        &self,
        entry: RecurringScheduleEntry,
    ) -> Result<RecurringScheduleEntry, ScheduleError> {
        let mut state = self.state.write().await;
        match state.schedules.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(entry)
            }
            None => Err(ScheduleError::ScheduleNotFound),
        }
    }

    async fn delete_schedule(&self, schedule_id: Uuid) -> Result<bool, ScheduleError> {
        Ok(self.state.write().await.schedules.remove(&schedule_id).is_some())
    }
}

#[async_trait]
impl HolidayCalendar for InMemoryClinicStore {
    async fn holidays_between(&self, range: &DateRange) -> Result<BTreeSet<NaiveDate>, ScheduleError> {
        Ok(self
            .state
            .read()
            .await
            .holidays
            .range(range.start()..=range.end())
            .map(|(date, _)| *date)
            .collect())
    }

    async fn add_holiday(&self, holiday: Holiday) -> Result<Holiday, ScheduleError> {
        self.state.write().await.holidays.insert(holiday.date, holiday.clone());
        Ok(holiday)
    }
}

#[async_trait]
impl SlotStore for InMemoryClinicStore {
    async fn insert_slots_if_absent(&self, slots: &[SlotCandidate]) -> Result<usize, ScheduleError> {
        let mut state = self.state.write().await;
        let mut inserted = 0;

        for candidate in slots {
            if state.slot_index.contains_key(&candidate.key()) {
                continue;
            }
            let slot = AvailableSlot::from_candidate(candidate);
            state.slot_index.insert(slot.key(), slot.id);
            state.slots.insert(slot.id, slot);
            inserted += 1;
        }

        debug!("Inserted {} of {} candidate slots", inserted, slots.len());
        Ok(inserted)
    }

    async fn list_open_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, ScheduleError> {
        let state = self.state.read().await;
        Ok(state
            .slot_index
            .iter()
            .filter(|((doctor, date, _), _)| *doctor == doctor_id && *date >= from)
            .filter_map(|(_, slot_id)| state.slots.get(slot_id))
            .filter(|slot| !slot.is_booked)
            .cloned()
            .collect())
    }

    async fn find_slot(
        &self,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<AvailableSlot>, ScheduleError> {
        let state = self.state.read().await;
        Ok(state
            .slot_index
            .get(&(doctor_id, slot_date, start_time))
            .and_then(|slot_id| state.slots.get(slot_id))
            .cloned())
    }

    async fn claim_slot(&self, slot_id: Uuid) -> Result<AvailableSlot, ScheduleError> {
        let mut state = self.state.write().await;
        let slot = state.slots.get_mut(&slot_id).ok_or(ScheduleError::SlotNotFound)?;
        if slot.is_booked {
            return Err(ScheduleError::SlotAlreadyBooked);
        }
        slot.is_booked = true;
        Ok(slot.clone())
    }
}

#[async_trait]
impl BookingStore for InMemoryClinicStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, AppointmentError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn book_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let mut state = self.state.write().await;

        let slot = state
            .slots
            .get_mut(&slot_id)
            .filter(|slot| slot.doctor_id == doctor_id)
            .ok_or(AppointmentError::SlotNotFound)?;
        if slot.is_booked {
            return Err(AppointmentError::SlotAlreadyBooked);
        }
        slot.is_booked = true;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            slot_id,
            appointment_date: slot.slot_date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.appointments.insert(appointment.id, appointment.clone());

        Ok(appointment)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.state.read().await.appointments.get(&appointment_id).cloned())
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut state = self.state.write().await;

        let Some(appointment) = state
            .appointments
            .get_mut(&appointment_id)
            .filter(|appointment| appointment.status == from)
        else {
            return Ok(None);
        };

        appointment.status = to;
        appointment.updated_at = Utc::now();
        let updated = appointment.clone();

        if to == AppointmentStatus::Cancelled {
            if let Some(slot) = state.slots.get_mut(&updated.slot_id) {
                slot.is_booked = false;
            }
        }

        Ok(Some(updated))
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .state
            .read()
            .await
            .sorted_appointments(|appointment| appointment.doctor_id == doctor_id))
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .state
            .read()
            .await
            .sorted_appointments(|appointment| appointment.patient_id == patient_id))
    }
}
