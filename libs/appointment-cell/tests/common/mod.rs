#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use appointment_cell::{BookingCoordinator, InMemoryClinicStore};
use availability_cell::{
    expand_slots, AvailableSlot, DateRange, DayOfWeek, RecurringScheduleEntry, SlotGranularity,
    SlotStore,
};
use shared_utils::test_utils::{date, time, TestUser};

// 2030-01-07 is a Monday.
pub const MONDAY: &str = "2030-01-07";

pub struct Clinic {
    pub store: Arc<InMemoryClinicStore>,
    pub coordinator: Arc<BookingCoordinator>,
    pub doctor: TestUser,
    pub patient: TestUser,
}

impl Clinic {
    /// One doctor working Mondays 09:00-10:15 and one patient, with slots
    /// generated for the week of `MONDAY`.
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryClinicStore::new());
        let doctor = TestUser::doctor();
        let patient = TestUser::patient();
        store.insert_user(doctor.to_user()).await;
        store.insert_user(patient.to_user()).await;

        let schedule =
            RecurringScheduleEntry::new(doctor.id, DayOfWeek::Monday, time("09:00"), time("10:15"))
                .unwrap();
        let range = DateRange::new(date(MONDAY), date("2030-01-13")).unwrap();
        let candidates = expand_slots(&[schedule], &range, SlotGranularity::default(), &BTreeSet::new());
        store.insert_slots_if_absent(&candidates).await.unwrap();

        let coordinator = Arc::new(BookingCoordinator::new(
            store.clone(),
            store.clone(),
            Duration::from_secs(2),
        ));

        Self {
            store,
            coordinator,
            doctor,
            patient,
        }
    }

    pub async fn add_patient(&self) -> Uuid {
        let patient = TestUser::patient();
        self.store.insert_user(patient.to_user()).await;
        patient.id
    }

    pub async fn slot_at(&self, start: &str) -> AvailableSlot {
        self.store
            .find_slot(self.doctor.id, date(MONDAY), time(start))
            .await
            .unwrap()
            .unwrap()
    }
}
