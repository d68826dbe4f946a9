pub mod error;
pub mod user;

pub use error::{AppError, ErrorKind};
pub use user::{ClinicUser, UserRole};
