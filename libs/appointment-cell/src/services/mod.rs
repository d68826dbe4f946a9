pub mod booking;
pub mod lifecycle;

pub use booking::BookingCoordinator;
pub use lifecycle::AppointmentLifecycleService;
