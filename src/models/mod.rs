pub mod appointment;
pub mod availability;
pub mod enums;
pub mod patient;
pub mod portal;
pub mod user;

pub use appointment::*;
pub use availability::*;
pub use enums::*;
pub use patient::*;
pub use portal::*;
pub use user::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Appointment {id} has a non-positive duration")]
    NonPositiveDuration { id: String },
}
