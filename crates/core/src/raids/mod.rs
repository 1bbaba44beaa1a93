mod error;
mod types;

pub use error::RaidError;
pub use types::{raids_by_trip, Raid, RaidComment, RaidInfo};
