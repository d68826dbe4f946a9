use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use appointment_cell::{
    appointment_routes, AppointmentState, BookingCoordinator, BookingStore, InMemoryClinicStore,
    SupabaseBookingStore,
};
use availability_cell::{
    schedule_routes, AvailabilityState, HolidayCalendar, HorizonConfig, HorizonScheduler,
    ScheduleError, ScheduleService, ScheduleStore, SlotStore, SupabaseAvailabilityStore,
    UserDirectory,
};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

/// Repository handles shared by the cells.
#[derive(Clone)]
pub struct Backends {
    pub schedules: Arc<dyn ScheduleStore>,
    pub holidays: Arc<dyn HolidayCalendar>,
    pub slots: Arc<dyn SlotStore>,
    pub users: Arc<dyn UserDirectory>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Backends {
    /// Supabase when credentials are present, otherwise a process-local store.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.is_configured() {
            info!("Using Supabase storage at {}", config.supabase_url);
            let client = Arc::new(SupabaseClient::new(config));
            let availability = Arc::new(SupabaseAvailabilityStore::with_client(client.clone()));
            Self {
                schedules: availability.clone(),
                holidays: availability.clone(),
                slots: availability.clone(),
                users: availability,
                bookings: Arc::new(SupabaseBookingStore::with_client(client)),
            }
        } else {
            Self::in_memory(Arc::new(InMemoryClinicStore::new()))
        }
    }

    pub fn in_memory(store: Arc<InMemoryClinicStore>) -> Self {
        info!("Using in-memory storage");
        Self {
            schedules: store.clone(),
            holidays: store.clone(),
            slots: store.clone(),
            users: store.clone(),
            bookings: store,
        }
    }
}

pub fn build_horizon(config: &AppConfig, backends: &Backends) -> Result<Arc<HorizonScheduler>, ScheduleError> {
    Ok(Arc::new(HorizonScheduler::new(
        backends.schedules.clone(),
        backends.holidays.clone(),
        backends.slots.clone(),
        HorizonConfig::from_app_config(config)?,
    )))
}

pub fn create_router(config: &AppConfig, backends: &Backends, horizon: Arc<HorizonScheduler>) -> Router {
    let availability = Arc::new(AvailabilityState {
        schedules: ScheduleService::new(backends.schedules.clone(), backends.users.clone()),
        horizon,
        holidays: backends.holidays.clone(),
    });

    let appointments = Arc::new(AppointmentState {
        coordinator: BookingCoordinator::new(
            backends.slots.clone(),
            backends.bookings.clone(),
            config.store_timeout(),
        ),
    });

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/schedules", schedule_routes(availability))
        .nest("/appointments", appointment_routes(appointments))
}
