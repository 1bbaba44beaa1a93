//! Functional core for doctrips.
//!
//! Pure domain types and computations for the trips database: year scoping,
//! trips and sections, transport matrices, volunteer applications and
//! grading, incoming students, trainings, the safety log, raids, gear
//! requests, email lists and CSV reports. Storage is abstracted
//! behind the repository traits in [`storage`]; no module here performs I/O.

#[cfg(feature = "auth")]
pub mod auth;
pub mod applications;
pub mod emails;
pub mod gear;
pub mod incoming;
pub mod matrix;
pub mod permissions;
pub mod raids;
pub mod record;
pub mod reports;
pub mod safety;
pub mod serde;
pub mod storage;
pub mod timetable;
pub mod training;
pub mod transport;
pub mod trips;
pub mod years;
