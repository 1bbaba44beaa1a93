mod error;
mod http_mapping;
mod table;
mod traits;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
pub use table::Table;
pub use traits::{
    Change, RecordStore, TimetableRepository, TripsYearRepository, UserRepository,
};
