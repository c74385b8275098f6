use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use covidview::aggregate::AggregationService;
use covidview::config::ConfigLoader;
use covidview::dataset::Dataset;
use covidview::error::DashboardError;
use covidview::feed::HttpFeedClient;
use covidview::output::{
    CountriesReport, JsonOutput, OutputMode, SeriesReport, StateEntry, StatesReport, TotalsReport,
    format_count,
};
use covidview::tui;

#[derive(Parser)]
#[command(name = "covidview")]
#[command(about = "Global COVID-19 dashboard over the Johns Hopkins CSSE time-series feeds")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Current totals for a country (optionally one state/province)")]
    Totals(QueryArgs),
    #[command(about = "Full daily series for a country (optionally one state/province)")]
    Series(QueryArgs),
    #[command(about = "List selectable countries")]
    Countries,
    #[command(about = "List selectable states/provinces of a country")]
    States(StatesArgs),
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    country: String,

    #[arg(long)]
    state: Option<String>,
}

#[derive(Args)]
struct StatesArgs {
    #[arg(long)]
    country: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<DashboardError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DashboardError) -> u8 {
    match error {
        DashboardError::ConfigRead(_) | DashboardError::ConfigParse(_) => 2,
        DashboardError::FeedHttp(_) | DashboardError::FeedStatus { .. } => 3,
        DashboardError::MalformedTable { .. } | DashboardError::InconsistentSchedule(_) => 4,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let client = HttpFeedClient::new(config.urls.clone(), config.timeout).into_diagnostic()?;
    let dataset = Dataset::load(&client).into_diagnostic()?;
    let service = AggregationService::new(dataset);

    match cli.command {
        Some(Commands::Totals(args)) => run_totals(args, service, output_mode),
        Some(Commands::Series(args)) => run_series(args, service, output_mode),
        Some(Commands::Countries) => run_countries(service, output_mode),
        Some(Commands::States(args)) => run_states(args, service, output_mode),
        None => match output_mode {
            OutputMode::Interactive => tui::run_dashboard(service),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `covidview totals --help`)",
            )),
        },
    }
}

fn run_totals(
    args: QueryArgs,
    service: AggregationService,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let totals = service.totals(&args.country, args.state.as_deref());
    let report = TotalsReport {
        country: args.country,
        state: args.state,
        as_of: service.dataset().as_of(),
        totals,
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_totals(&report).into_diagnostic(),
        OutputMode::Interactive => {
            print_totals_summary(&report);
            Ok(())
        }
    }
}

fn run_series(
    args: QueryArgs,
    service: AggregationService,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let series = service.entry_series(&args.country, args.state.as_deref());
    let report = SeriesReport {
        country: args.country,
        state: args.state,
        series,
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_series(&report).into_diagnostic(),
        OutputMode::Interactive => {
            print_series_summary(&report);
            Ok(())
        }
    }
}

fn run_countries(service: AggregationService, output_mode: OutputMode) -> miette::Result<()> {
    let report = CountriesReport {
        countries: service
            .dataset()
            .regions()
            .countries()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_countries(&report).into_diagnostic(),
        OutputMode::Interactive => {
            for country in &report.countries {
                println!("{country}");
            }
            Ok(())
        }
    }
}

fn run_states(
    args: StatesArgs,
    service: AggregationService,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let regions = service.dataset().regions();
    let states = regions
        .states_for(&args.country)
        .into_iter()
        .map(|state| StateEntry {
            name: state.to_string(),
            info: regions
                .info(&args.country, Some(state))
                .cloned()
                .unwrap_or_default(),
        })
        .collect();
    let report = StatesReport {
        country: args.country,
        states,
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_states(&report).into_diagnostic(),
        OutputMode::Interactive => {
            for state in &report.states {
                println!("{}", state.name);
            }
            Ok(())
        }
    }
}

fn print_totals_summary(report: &TotalsReport) {
    let cyan = "\x1b[36m";
    let green = "\x1b[32m";
    let red = "\x1b[31m";
    let gray = "\x1b[90m";
    let reset = "\x1b[0m";

    let region = match &report.state {
        Some(state) => format!("{state}, {}", report.country),
        None => report.country.clone(),
    };
    let as_of = report
        .as_of
        .map(|date| date.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    println!("{cyan}{region}{reset} {gray}(as of {as_of}){reset}");
    println!("{cyan}  confirmed: {}{reset}", format_count(report.totals.confirmed));
    println!("{green}  recovered: {}{reset}", format_count(report.totals.recovered));
    println!("{red}  deaths:    {}{reset}", format_count(report.totals.deaths));
}

fn print_series_summary(report: &SeriesReport) {
    let gray = "\x1b[90m";
    let reset = "\x1b[0m";

    let dates = &report.series.dates;
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => {
            println!("{gray}{} dates from {first} to {last}{reset}", dates.len());
        }
        _ => println!("{gray}empty date axis{reset}"),
    }
    for (label, rows) in [
        ("confirmed", &report.series.confirmed),
        ("recovered", &report.series.recovered),
        ("deaths", &report.series.deaths),
    ] {
        println!("{label}: {} matching row(s)", rows.len());
        for row in rows {
            let latest = row.values.last().copied().unwrap_or(0);
            println!("  {} -> {}", row.key, format_count(latest));
        }
    }
}
