use chrono::NaiveDate;
use clap::Parser;
use dashboard::{
    DashboardError, FilterRequest, OutputFormat, Page, ReportConfig, Season, Session,
    SimpleLogger, filter, render,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gzip-compressed hourly rental CSV
    #[arg(short, long, default_value = "cleaned_hour.csv.gz")]
    input: PathBuf,

    /// First day to include (YYYY-MM-DD). Defaults to the earliest day in the data.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD). Defaults to the latest day in the data.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Seasons to keep (e.g. spring,fall). Defaults to every season in the data;
    /// passing the flag with no value selects nothing.
    #[arg(short, long, value_delimiter = ',', num_args = 0.., ignore_case = true)]
    seasons: Option<Vec<Season>>,

    /// Page to render
    #[arg(short, long, default_value = "home")]
    page: Page,

    /// Seasons compared on the season page. Defaults to the seasons left after filtering.
    #[arg(long, value_delimiter = ',', num_args = 0.., ignore_case = true)]
    analysis_seasons: Option<Vec<Season>>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Number of rows shown on the home page
    #[arg(long, default_value_t = 10)]
    rows: usize,

    /// Width of bar charts in characters
    #[arg(long, default_value_t = 40)]
    width: usize,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ DashboardError::DataSourceNotFound { .. }) => {
            error!("{err}");
            error!("Stopping: the rental dataset is required to build the dashboard");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), DashboardError> {
    let total_start = Instant::now();
    let session = Session::new(args.input.clone());
    let table = session.table()?;

    let request = FilterRequest {
        start: args.start,
        end: args.end,
        seasons: args.seasons,
    };
    let Some((range, seasons)) = request.resolve(table) else {
        warn!("{} contains no rows, nothing to show", session.source().display());
        return Ok(());
    };
    if range.is_inverted() {
        warn!(
            "Start date {} is after end date {}, no rows will match",
            range.start, range.end
        );
    }
    debug!(
        "Date range: {} to {} | Seasons: {:?} | Page: {:?}",
        range.start, range.end, seasons, args.page
    );

    let view = filter(table, range, &seasons);
    info!("{} of {} rows match the current filters", view.len(), table.len());

    let config = ReportConfig {
        page: args.page,
        format: args.format,
        preview_rows: args.rows,
        chart_width: args.width,
        analysis_seasons: args.analysis_seasons,
    };
    let output = render(&view, &config)?;
    print!("{output}");

    debug!("Rendered {:?} page in {:.2?}", config.page, total_start.elapsed());
    Ok(())
}
