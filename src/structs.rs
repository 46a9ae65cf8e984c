use chrono::NaiveDate;
use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple logger implementation
///
/// Writes to stderr so page output on stdout (text or JSON) stays clean.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// One row as it appears in the source CSV, before normalization.
///
/// Only the columns the dashboard needs are declared; any other column in the
/// file is ignored by the deserializer. Blank code cells read as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub dteday: String,
    #[serde(default)]
    pub hr: Option<u8>,
    pub season: Option<i64>,
    pub weathersit: Option<i64>,
    pub workingday: Option<i64>,
    pub cnt: u32,
}

/// Columns that must be present in the CSV header.
pub const REQUIRED_COLUMNS: [&str; 5] = ["dteday", "season", "weathersit", "workingday", "cnt"];

/// Hourly rental observation with its derived categorical labels.
///
/// Labels are computed once by [`RentalRecord::from_codes`] and never change
/// afterwards. Unmapped weather or season codes keep the row and leave the
/// label as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalRecord {
    pub timestamp: NaiveDate,
    pub hour: Option<u8>,
    pub season_code: Option<i64>,
    pub weather_code: Option<i64>,
    pub is_working_day: bool,
    pub rental_count: u32,
    pub day_type: DayType,
    pub weather_label: Option<Weather>,
    pub season_label: Option<Season>,
}

impl RentalRecord {
    pub fn new(
        timestamp: NaiveDate,
        season_code: i64,
        weather_code: i64,
        workingday: i64,
        rental_count: u32,
    ) -> Self {
        Self::from_codes(
            timestamp,
            Some(season_code),
            Some(weather_code),
            Some(workingday),
            rental_count,
        )
    }

    /// Builds a record from possibly blank code cells.
    pub fn from_codes(
        timestamp: NaiveDate,
        season_code: Option<i64>,
        weather_code: Option<i64>,
        workingday: Option<i64>,
        rental_count: u32,
    ) -> Self {
        let day_type = DayType::from_flag(workingday);
        Self {
            timestamp,
            hour: None,
            season_code,
            weather_code,
            is_working_day: day_type == DayType::WorkingDay,
            rental_count,
            day_type,
            weather_label: Weather::from_code(weather_code),
            season_label: Season::from_code(season_code),
        }
    }

    pub fn with_hour(mut self, hour: Option<u8>) -> Self {
        self.hour = hour;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayType {
    WorkingDay,
    Weekend,
}

impl DayType {
    /// `workingday == 1` is a working day; every other value, blank included,
    /// counts as weekend.
    pub fn from_flag(workingday: Option<i64>) -> Self {
        if workingday == Some(1) {
            DayType::WorkingDay
        } else {
            DayType::Weekend
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayType::WorkingDay => "Working Day",
            DayType::Weekend => "Weekend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weather {
    Clear,
    CloudyLightRain,
    HeavyRain,
    Extreme,
}

impl Weather {
    pub fn from_code(code: Option<i64>) -> Option<Self> {
        match code? {
            1 => Some(Weather::Clear),
            2 => Some(Weather::CloudyLightRain),
            3 => Some(Weather::HeavyRain),
            4 => Some(Weather::Extreme),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::CloudyLightRain => "Cloudy/Light Rain",
            Weather::HeavyRain => "Heavy Rain",
            Weather::Extreme => "Extreme",
        }
    }
}

/// Season label, also accepted on the command line (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
pub enum Season {
    Spring,
    Summer,
    #[value(alias = "autumn")]
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_code(code: Option<i64>) -> Option<Self> {
        match code? {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

/// Column a filtered view can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Weather,
    DayType,
    Season,
}

/// Value of a [`GroupKey`] for a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupValue {
    Weather(Weather),
    DayType(DayType),
    Season(Season),
}

impl GroupValue {
    pub fn label(&self) -> &'static str {
        match self {
            GroupValue::Weather(w) => w.label(),
            GroupValue::DayType(d) => d.label(),
            GroupValue::Season(s) => s.label(),
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean rental count of one group, with the number of rows behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub group: GroupValue,
    pub mean: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Max,
    Min,
}

/// Inclusive date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Always false for an inverted range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Facts shown on the conclusions page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusions {
    pub highest_weather: GroupMean,
    pub lowest_weather: GroupMean,
    pub working_day_mean: Option<f64>,
    pub weekend_mean: Option<f64>,
    pub highest_season: GroupMean,
}

/// Dashboard page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Page {
    Home,
    Weather,
    Workday,
    Season,
    Conclusions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Configuration for rendering a page
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub page: Page,
    pub format: OutputFormat,
    pub preview_rows: usize,
    pub chart_width: usize,
    /// Season page selection; `None` keeps every season present in the view.
    pub analysis_seasons: Option<Vec<Season>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: Page::Home,
            format: OutputFormat::Text,
            preview_rows: 10,
            chart_width: 40,
            analysis_seasons: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2011, 1, 1).unwrap()
    }

    #[test]
    fn day_type_follows_working_day_flag() {
        assert_eq!(RentalRecord::new(day(), 1, 1, 1, 5).day_type, DayType::WorkingDay);
        assert_eq!(RentalRecord::new(day(), 1, 1, 0, 5).day_type, DayType::Weekend);
        assert!(RentalRecord::new(day(), 1, 1, 1, 5).is_working_day);
        assert!(!RentalRecord::new(day(), 1, 1, 0, 5).is_working_day);
    }

    #[test]
    fn known_codes_map_to_fixed_labels() {
        let weather: Vec<_> = (1..=4).filter_map(|c| Weather::from_code(Some(c))).collect();
        assert_eq!(
            weather,
            vec![
                Weather::Clear,
                Weather::CloudyLightRain,
                Weather::HeavyRain,
                Weather::Extreme
            ]
        );
        let seasons: Vec<_> = (1..=4).filter_map(|c| Season::from_code(Some(c))).collect();
        assert_eq!(seasons, Season::ALL.to_vec());
    }

    #[test]
    fn unknown_codes_keep_row_without_label() {
        let record = RentalRecord::new(day(), 7, 0, 1, 12);
        assert_eq!(record.weather_label, None);
        assert_eq!(record.season_label, None);
        assert_eq!(record.season_code, Some(7));
        assert_eq!(record.rental_count, 12);
    }

    #[test]
    fn blank_codes_keep_row_without_label() {
        let record = RentalRecord::from_codes(day(), None, None, None, 9);
        assert_eq!(record.season_label, None);
        assert_eq!(record.weather_label, None);
        assert_eq!(record.day_type, DayType::Weekend);
        assert_eq!(record.rental_count, 9);
    }

    #[test]
    fn labels_are_pure_functions_of_codes() {
        let a = RentalRecord::new(day(), 3, 2, 0, 40);
        let b = RentalRecord::new(day(), 3, 2, 0, 40);
        assert_eq!(a, b);
    }

    #[test]
    fn inverted_range_contains_nothing() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2011, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
        );
        assert!(range.is_inverted());
        assert!(!range.contains(NaiveDate::from_ymd_opt(2011, 1, 15).unwrap()));
    }
}
