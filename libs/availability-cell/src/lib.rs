pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use handlers::AvailabilityState;
pub use models::*;
pub use router::schedule_routes;
pub use services::*;
pub use store::{
    HolidayCalendar, ScheduleStore, SlotStore, SupabaseAvailabilityStore, UserDirectory,
};
