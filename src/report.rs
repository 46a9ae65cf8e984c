//! Page rendering for the dashboard.
//!
//! Pages only format what the engine computes; every number shown here comes
//! from `transform`. Text output is deterministic so it can be asserted on.

use crate::error::{DashboardError, Result};
use crate::structs::{
    Conclusions, GroupKey, GroupMean, OutputFormat, Page, RentalRecord, ReportConfig, Season,
};
use crate::transform::{FilteredView, aggregate_mean_by, conclude};
use serde::Serialize;

const NO_DATA: &str = "No data available for conclusions.";

/// Data behind one rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageReport<'a> {
    Home {
        rows: usize,
        preview: Vec<&'a RentalRecord>,
    },
    Weather {
        groups: Vec<GroupMean>,
    },
    Workday {
        groups: Vec<GroupMean>,
    },
    Season {
        seasons: Vec<Season>,
        groups: Vec<GroupMean>,
    },
    /// `None` when the view holds no data to conclude from.
    Conclusions {
        conclusions: Option<Conclusions>,
    },
}

/// Builds the data for `config.page` from an already filtered view.
pub fn build_report<'a>(view: &FilteredView<'a>, config: &ReportConfig) -> Result<PageReport<'a>> {
    let report = match config.page {
        Page::Home => PageReport::Home {
            rows: view.len(),
            preview: view.head(config.preview_rows).to_vec(),
        },
        Page::Weather => PageReport::Weather {
            groups: aggregate_mean_by(view, GroupKey::Weather),
        },
        Page::Workday => PageReport::Workday {
            groups: aggregate_mean_by(view, GroupKey::DayType),
        },
        Page::Season => {
            let seasons = config
                .analysis_seasons
                .clone()
                .unwrap_or_else(|| view.seasons());
            let narrowed = view.retain_seasons(&seasons);
            PageReport::Season {
                groups: aggregate_mean_by(&narrowed, GroupKey::Season),
                seasons,
            }
        }
        Page::Conclusions => match conclude(view) {
            Ok(conclusions) => PageReport::Conclusions {
                conclusions: Some(conclusions),
            },
            Err(DashboardError::EmptyAggregate) => PageReport::Conclusions { conclusions: None },
            Err(e) => return Err(e),
        },
    };
    Ok(report)
}

/// Renders `config.page` in the configured output format.
pub fn render(view: &FilteredView<'_>, config: &ReportConfig) -> Result<String> {
    let report = build_report(view, config)?;
    match config.format {
        OutputFormat::Text => Ok(render_text(&report, config.chart_width)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
    }
}

pub fn render_text(report: &PageReport<'_>, chart_width: usize) -> String {
    let mut out = String::new();
    match report {
        PageReport::Home { rows, preview } => {
            out.push_str("=== Bike Rental Dashboard ===\n");
            out.push_str("Rentals by weather, season and day type.\n\n");
            out.push_str(&format!(
                "Filtered data sample ({} of {} rows):\n",
                preview.len(),
                rows
            ));
            out.push_str(&format_preview(preview));
        }
        PageReport::Weather { groups } => {
            out.push_str("=== Weather and Bike Rentals ===\n");
            out.push_str("Average rentals by weather condition:\n");
            out.push_str(&render_bar_chart(groups, chart_width));
        }
        PageReport::Workday { groups } => {
            out.push_str("=== Working Days vs Weekends ===\n");
            out.push_str("Average rentals by day type:\n");
            out.push_str(&render_bar_chart(groups, chart_width));
        }
        PageReport::Season { seasons, groups } => {
            out.push_str("=== Seasons and Bike Rentals ===\n");
            let names: Vec<&str> = seasons.iter().map(Season::label).collect();
            out.push_str(&format!("Seasons analysed: {}\n", names.join(", ")));
            out.push_str("Average rentals by season:\n");
            out.push_str(&render_bar_chart(groups, chart_width));
        }
        PageReport::Conclusions { conclusions } => {
            out.push_str("=== Bike Rental Conclusions ===\n");
            match conclusions {
                Some(c) => out.push_str(&format_conclusions(c)),
                None => {
                    out.push_str(NO_DATA);
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Horizontal bar chart, one line per group, scaled to the largest mean.
pub fn render_bar_chart(groups: &[GroupMean], width: usize) -> String {
    if groups.is_empty() {
        return "(no data)\n".to_string();
    }
    let label_width = groups.iter().map(|g| g.group.label().len()).max().unwrap_or(0);
    let max_mean = groups.iter().fold(0.0_f64, |m, g| m.max(g.mean));

    let mut out = String::new();
    for g in groups {
        let len = if max_mean > 0.0 {
            ((g.mean / max_mean) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<label_width$} | {:<width$} {:.2}\n",
            g.group.label(),
            "#".repeat(len),
            g.mean
        ));
    }
    out
}

fn format_preview(rows: &[&RentalRecord]) -> String {
    let mut out = format!(
        "{:<10}  {:>2}  {:<6}  {:<17}  {:<11}  {:>5}\n",
        "date", "hr", "season", "weather", "day type", "cnt"
    );
    for r in rows {
        out.push_str(&format!(
            "{:<10}  {:>2}  {:<6}  {:<17}  {:<11}  {:>5}\n",
            r.timestamp.to_string(),
            r.hour.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string()),
            r.season_label.map(|s| s.label()).unwrap_or("-"),
            r.weather_label.map(|w| w.label()).unwrap_or("-"),
            r.day_type.label(),
            r.rental_count
        ));
    }
    out
}

fn format_conclusions(c: &Conclusions) -> String {
    let mut out = String::new();
    out.push_str("Weather:\n");
    out.push_str(&format!(
        "- Highest rentals occur in {} weather with an average of {:.2} rentals.\n",
        c.highest_weather.group, c.highest_weather.mean
    ));
    out.push_str(&format!(
        "- Lowest rentals occur in {} weather with an average of {:.2} rentals.\n",
        c.lowest_weather.group, c.lowest_weather.mean
    ));
    out.push_str("Working days:\n");
    out.push_str(&format!(
        "- Average rentals on working days: {}.\n",
        format_mean(c.working_day_mean)
    ));
    out.push_str(&format!(
        "- Average rentals on weekends: {}.\n",
        format_mean(c.weekend_mean)
    ));
    out.push_str("Seasons:\n");
    out.push_str(&format!(
        "- Highest rentals occur in {} with an average of {:.2} rentals.\n",
        c.highest_season.group, c.highest_season.mean
    ));
    out
}

fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(m) => format!("{:.2} rentals", m),
        None => "no data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::NormalizedTable;
    use crate::structs::{DateRange, DayType, GroupValue, Weather};
    use crate::transform::filter;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2011, 1, d).unwrap()
    }

    fn table() -> NormalizedTable {
        NormalizedTable::new(vec![
            RentalRecord::new(date(1), 1, 1, 1, 10),
            RentalRecord::new(date(2), 1, 2, 0, 20).with_hour(Some(7)),
            RentalRecord::new(date(3), 2, 1, 1, 30),
        ])
    }

    fn config(page: Page) -> ReportConfig {
        ReportConfig {
            page,
            chart_width: 10,
            ..ReportConfig::default()
        }
    }

    #[test]
    fn bar_chart_golden() {
        let groups = vec![
            GroupMean {
                group: GroupValue::Weather(Weather::Clear),
                mean: 10.0,
                rows: 1,
            },
            GroupMean {
                group: GroupValue::Weather(Weather::CloudyLightRain),
                mean: 20.0,
                rows: 1,
            },
        ];
        let expected = concat!(
            "Clear             | #####      10.00\n",
            "Cloudy/Light Rain | ########## 20.00\n",
        );
        assert_eq!(render_bar_chart(&groups, 10), expected);
    }

    #[test]
    fn bar_chart_without_groups() {
        assert_eq!(render_bar_chart(&[], 10), "(no data)\n");
    }

    #[test]
    fn home_preview_is_limited() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &Season::ALL);
        let cfg = ReportConfig {
            preview_rows: 2,
            ..config(Page::Home)
        };
        match build_report(&view, &cfg).unwrap() {
            PageReport::Home { rows, preview } => {
                assert_eq!(rows, 3);
                assert_eq!(preview.len(), 2);
            }
            other => panic!("unexpected report {other:?}"),
        }
        let text = render(&view, &cfg).unwrap();
        assert!(text.contains("(2 of 3 rows)"));
        assert!(text.contains("2011-01-02"));
        assert!(!text.contains("2011-01-03"));
    }

    #[test]
    fn workday_page_groups_by_day_type() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &Season::ALL);
        match build_report(&view, &config(Page::Workday)).unwrap() {
            PageReport::Workday { groups } => {
                let pairs: Vec<_> = groups.iter().map(|g| (g.group, g.mean)).collect();
                assert_eq!(
                    pairs,
                    vec![
                        (GroupValue::DayType(DayType::WorkingDay), 20.0),
                        (GroupValue::DayType(DayType::Weekend), 20.0)
                    ]
                );
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn season_page_applies_its_own_selection() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &Season::ALL);
        let cfg = ReportConfig {
            analysis_seasons: Some(vec![Season::Summer]),
            ..config(Page::Season)
        };
        match build_report(&view, &cfg).unwrap() {
            PageReport::Season { seasons, groups } => {
                assert_eq!(seasons, vec![Season::Summer]);
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].mean, 30.0);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn season_page_defaults_to_seasons_in_view() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &Season::ALL);
        let text = render(&view, &config(Page::Season)).unwrap();
        assert!(text.contains("Seasons analysed: Spring, Summer"));
    }

    #[test]
    fn conclusions_page_handles_empty_view() {
        let table = table();
        let view = filter(&table, DateRange::new(date(3), date(1)), &Season::ALL);
        let text = render(&view, &config(Page::Conclusions)).unwrap();
        assert!(text.contains(NO_DATA));
    }

    #[test]
    fn conclusions_page_text() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &[Season::Spring]);
        let text = render(&view, &config(Page::Conclusions)).unwrap();
        assert!(text.contains(
            "Highest rentals occur in Cloudy/Light Rain weather with an average of 20.00 rentals."
        ));
        assert!(
            text.contains("Lowest rentals occur in Clear weather with an average of 10.00 rentals.")
        );
        assert!(text.contains("Average rentals on working days: 10.00 rentals."));
        assert!(text.contains("Highest rentals occur in Spring with an average of 15.00 rentals."));
    }

    #[test]
    fn json_output_is_tagged_by_page() {
        let table = table();
        let view = filter(&table, DateRange::new(date(1), date(3)), &[Season::Spring]);
        let cfg = ReportConfig {
            format: OutputFormat::Json,
            ..config(Page::Weather)
        };
        let json: serde_json::Value = serde_json::from_str(&render(&view, &cfg).unwrap()).unwrap();
        assert_eq!(json["page"], "weather");
        assert_eq!(json["groups"][0]["group"], "Clear");
        assert_eq!(json["groups"][1]["mean"], 20.0);
    }
}
