mod counts;
mod csv_reports;
mod error;
mod table;

pub use counts::{statistics, tshirt_counts, Statistics, StatusCounts, TshirtCounts, Tshirts};
pub use csv_reports::{ReportKind, YearData};
pub use error::ReportError;
pub use table::{dollars, CsvTable};
