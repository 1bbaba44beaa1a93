pub mod applications;
pub mod authz;
pub mod crud;
pub mod emails;
pub mod error;
pub mod flash;
pub mod gear;
pub mod grading;
pub mod health;
pub mod incoming;
pub mod kinds;
pub mod portal;
pub mod raids;
pub mod reports;
pub mod timetable;
pub mod trainings;
pub mod transport;
pub mod trips;
pub mod users;
pub mod years;

pub use error::AppError;
