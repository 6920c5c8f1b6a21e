pub mod search;

pub use search::{validate_name, Appointment, AppointmentSearch, HttpAppointmentSearch};
