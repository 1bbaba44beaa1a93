mod types;

pub use types::{gear_totals, Gear, GearError, GearRequest, GearTotal, Requester};
