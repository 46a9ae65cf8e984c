use crate::error::{DashboardError, Result};
use crate::structs::{REQUIRED_COLUMNS, RawRecord, RentalRecord, Season};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::OnceLock,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Immutable, fully labelled rental dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedTable {
    records: Vec<RentalRecord>,
}

impl NormalizedTable {
    pub fn new(records: Vec<RentalRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RentalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest timestamp, i.e. the valid filter range.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.timestamp;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.timestamp), hi.max(r.timestamp))
        }))
    }

    /// Distinct season labels in order of first appearance.
    pub fn seasons(&self) -> Vec<Season> {
        let mut seen = Vec::with_capacity(Season::ALL.len());
        for season in self.records.iter().filter_map(|r| r.season_label) {
            if !seen.contains(&season) {
                seen.push(season);
            }
        }
        seen
    }
}

/// Loads a gzip-compressed rental CSV and derives the categorical labels.
///
/// # Errors
///
/// Returns `DashboardError::DataSourceNotFound` if the file cannot be opened,
/// and `DashboardError::Parse` if the stream is not valid gzip/CSV, a required
/// column is missing, or a row cannot be decoded.
pub fn load(path: &Path) -> Result<NormalizedTable> {
    debug!("Opening rental data: {}", path.display());
    let file = File::open(path).map_err(|source| DashboardError::DataSourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table(GzDecoder::new(file))?;

    match table.date_range() {
        Some((min, max)) => info!(
            "Loaded {} rental records from {} ({} to {})",
            table.len(),
            path.display(),
            min,
            max
        ),
        None => info!("Loaded an empty rental table from {}", path.display()),
    }
    Ok(table)
}

/// Parses decompressed CSV content into a [`NormalizedTable`].
pub fn read_table<R: Read>(reader: R) -> Result<NormalizedTable> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers)?;

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while rdr.read_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| DashboardError::Parse(format!("line {}: {}", line, e)))?;
        records.push(normalize(raw, line)?);
    }

    debug!("Parsed {} rows", records.len());
    Ok(NormalizedTable::new(records))
}

fn check_columns(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::Parse(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

fn normalize(raw: RawRecord, line: u64) -> Result<RentalRecord> {
    let date = parse_date(&raw.dteday).ok_or_else(|| {
        DashboardError::Parse(format!("line {}: invalid date '{}'", line, raw.dteday))
    })?;
    Ok(
        RentalRecord::from_codes(date, raw.season, raw.weathersit, raw.workingday, raw.cnt)
            .with_hour(raw.hr),
    )
}

/// Accepts a plain date or a full timestamp, keeping only the date part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map(|dt| dt.date()))
        .ok()
}

/// Dataset handle for one dashboard session.
///
/// The table is read on the first call to [`Session::table`] and reused for
/// the lifetime of the session; dropping the session releases it.
#[derive(Debug)]
pub struct Session {
    source: PathBuf,
    table: OnceLock<NormalizedTable>,
}

impl Session {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            table: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn table(&self) -> Result<&NormalizedTable> {
        if let Some(table) = self.table.get() {
            debug!("Using cached table for {}", self.source.display());
            return Ok(table);
        }
        let table = load(&self.source)?;
        Ok(self.table.get_or_init(|| table))
    }
}
