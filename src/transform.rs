use crate::error::{DashboardError, Result};
use crate::load::NormalizedTable;
use crate::structs::{
    Conclusions, DateRange, DayType, Direction, GroupKey, GroupMean, GroupValue, RentalRecord,
    Season,
};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Rows of a [`NormalizedTable`] that match one filter request.
///
/// A view borrows from the table and is never changed after construction;
/// narrowing it produces a new view.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a RentalRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a RentalRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, in table order.
    pub fn head(&self, n: usize) -> &[&'a RentalRecord] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Distinct season labels in the view, in order of first appearance.
    pub fn seasons(&self) -> Vec<Season> {
        let mut seen = Vec::new();
        for season in self.rows.iter().filter_map(|r| r.season_label) {
            if !seen.contains(&season) {
                seen.push(season);
            }
        }
        seen
    }

    /// A new view keeping only rows whose season is in `seasons`.
    pub fn retain_seasons(&self, seasons: &[Season]) -> FilteredView<'a> {
        FilteredView {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|r| season_selected(r, seasons))
                .collect(),
        }
    }

    /// Mean rental count for one day type, `None` if it has no rows.
    pub fn mean_for_day_type(&self, day_type: DayType) -> Option<f64> {
        mean(
            self.rows
                .iter()
                .filter(|r| r.day_type == day_type)
                .map(|r| r.rental_count),
        )
    }
}

/// Selects rows whose date is inside `range` and whose season is in `seasons`.
///
/// An empty season list or an inverted range yields an empty view. Rows with
/// an unmapped season code never match a season selection.
pub fn filter<'a>(
    table: &'a NormalizedTable,
    range: DateRange,
    seasons: &[Season],
) -> FilteredView<'a> {
    if range.is_inverted() {
        debug!(
            "Inverted date range {} > {}, returning empty view",
            range.start, range.end
        );
        return FilteredView { rows: Vec::new() };
    }

    let rows: Vec<&RentalRecord> = table
        .records()
        .iter()
        .filter(|r| range.contains(r.timestamp) && season_selected(r, seasons))
        .collect();

    debug!(
        "Filter {}..={} seasons={:?}: {} of {} rows",
        range.start,
        range.end,
        seasons,
        rows.len(),
        table.len()
    );
    FilteredView { rows }
}

/// Filter inputs as a caller supplies them; unset fields take table defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// `None` selects every season present; `Some(vec![])` selects nothing.
    pub seasons: Option<Vec<Season>>,
}

impl FilterRequest {
    /// Fills unset bounds from the table's date range and unset seasons from
    /// the seasons present in the table. `None` for an empty table.
    pub fn resolve(&self, table: &NormalizedTable) -> Option<(DateRange, Vec<Season>)> {
        let (min, max) = table.date_range()?;
        let range = DateRange::new(self.start.unwrap_or(min), self.end.unwrap_or(max));
        let seasons = self.seasons.clone().unwrap_or_else(|| table.seasons());
        Some((range, seasons))
    }
}

fn season_selected(record: &RentalRecord, seasons: &[Season]) -> bool {
    record
        .season_label
        .is_some_and(|season| seasons.contains(&season))
}

/// Mean `rental_count` per group of `key`, in natural label order.
///
/// Groups without rows are omitted, and so are rows whose key has no label.
pub fn aggregate_mean_by(view: &FilteredView<'_>, key: GroupKey) -> Vec<GroupMean> {
    let mut sums: BTreeMap<GroupValue, (u64, usize)> = BTreeMap::new();
    for record in view.rows() {
        if let Some(group) = group_value(record, key) {
            let entry = sums.entry(group).or_insert((0, 0));
            entry.0 += u64::from(record.rental_count);
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(group, (sum, rows))| GroupMean {
            group,
            mean: sum as f64 / rows as f64,
            rows,
        })
        .collect()
}

fn group_value(record: &RentalRecord, key: GroupKey) -> Option<GroupValue> {
    match key {
        GroupKey::Weather => record.weather_label.map(GroupValue::Weather),
        GroupKey::DayType => Some(GroupValue::DayType(record.day_type)),
        GroupKey::Season => record.season_label.map(GroupValue::Season),
    }
}

/// Group with the largest (or smallest) mean; ties go to the earlier group.
///
/// # Errors
///
/// Returns `DashboardError::EmptyAggregate` when `aggregates` is empty.
pub fn extremum(aggregates: &[GroupMean], direction: Direction) -> Result<GroupMean> {
    let mut iter = aggregates.iter();
    let first = iter.next().ok_or(DashboardError::EmptyAggregate)?;
    let best = iter.fold(first, |best, candidate| {
        let better = match direction {
            Direction::Max => candidate.mean > best.mean,
            Direction::Min => candidate.mean < best.mean,
        };
        if better { candidate } else { best }
    });
    Ok(best.clone())
}

/// Computes the facts shown on the conclusions page.
///
/// # Errors
///
/// Returns `DashboardError::EmptyAggregate` if the view has no rows, or if
/// none of its rows carries a weather or season label.
pub fn conclude(view: &FilteredView<'_>) -> Result<Conclusions> {
    if view.is_empty() {
        return Err(DashboardError::EmptyAggregate);
    }
    let weather = aggregate_mean_by(view, GroupKey::Weather);
    let seasons = aggregate_mean_by(view, GroupKey::Season);

    Ok(Conclusions {
        highest_weather: extremum(&weather, Direction::Max)?,
        lowest_weather: extremum(&weather, Direction::Min)?,
        working_day_mean: view.mean_for_day_type(DayType::WorkingDay),
        weekend_mean: view.mean_for_day_type(DayType::Weekend),
        highest_season: extremum(&seasons, Direction::Max)?,
    })
}

fn mean(counts: impl Iterator<Item = u32>) -> Option<f64> {
    let (sum, n) = counts.fold((0u64, 0usize), |(s, n), c| (s + u64::from(c), n + 1));
    if n == 0 { None } else { Some(sum as f64 / n as f64) }
}
