use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unknown report: {0}")]
    UnknownReport(String),
    #[error("Incoming student settings for {0} have not been created")]
    MissingSettings(i32),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}
