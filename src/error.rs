use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Data source not found: {}", path.display())]
    DataSourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("No data available for the current selection")]
    EmptyAggregate,
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        // Covers gzip stream errors too: the decoder sits under the csv reader.
        DashboardError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
