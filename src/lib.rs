pub mod error;
pub mod load;
pub mod report;
pub mod structs;
pub mod transform;

// Re-export public API
pub use error::{DashboardError, Result};
pub use load::{NormalizedTable, Session, load};
pub use report::{PageReport, build_report, render};
pub use structs::{
    Conclusions, DateRange, DayType, Direction, GroupKey, GroupMean, GroupValue, OutputFormat,
    Page, RentalRecord, ReportConfig, Season, SimpleLogger, Weather,
};
pub use transform::{FilterRequest, FilteredView, aggregate_mean_by, conclude, extremum, filter};
