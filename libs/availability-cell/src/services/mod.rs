pub mod expansion;
pub mod horizon;
pub mod schedule;

pub use expansion::{expand_slots, group_by_doctor, slice_window};
pub use horizon::{DoctorFailure, HorizonConfig, HorizonHandle, HorizonRunReport, HorizonScheduler};
pub use schedule::ScheduleService;
