mod app;
mod render;
mod state;

use crate::app::App;
use crate::state::app_settings::{AppSettings, DEFAULT_LOG_FILTER};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use showroom_api::{EventFilter, ProbeResult};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "showroom-rank", version, about = "SHOWROOM event browser and ranking resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Upstream origin (overrides SHOWROOM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (overrides SHOWROOM_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Delay between ranking requests in milliseconds (overrides SHOWROOM_PACING_MS)
    #[arg(long, global = true)]
    pacing_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List events from the search endpoint
    Events {
        /// Search pages to fetch (1-50)
        #[arg(long, default_value_t = 3)]
        pages: u32,
        /// ongoing, ended or all
        #[arg(long, default_value_t = EventFilter::Ongoing)]
        filter: EventFilter,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resolve the ranking of one event
    Ranking {
        event_id: i64,
        /// The event's url key, enables the key-based endpoints
        #[arg(long)]
        key: Option<String>,
        /// Pages to fetch per endpoint
        #[arg(long, default_value_t = 10)]
        max_pages: u32,
        /// Rows to print
        #[arg(long, default_value_t = 100)]
        top: usize,
        #[arg(long)]
        json: bool,
        /// Show every attempted URL on failure
        #[arg(long)]
        verbose: bool,
    },
    /// List events, then pick them by number to resolve their rankings
    Browse {
        #[arg(long, default_value_t = 3)]
        pages: u32,
        #[arg(long, default_value_t = EventFilter::Ongoing)]
        filter: EventFilter,
        #[arg(long, default_value_t = 10)]
        max_pages: u32,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    better_panic::install();
    init_logging();

    let cli = Cli::parse();
    let settings = apply_overrides(AppSettings::load(), &cli);
    let mut app = App::new(settings)?;
    info!("using {}", app.settings.api.base_url);

    match cli.command {
        Command::Events { pages, filter, json } => run_events(&mut app, pages, filter, json),
        Command::Ranking { event_id, key, max_pages, top, json, verbose } => {
            run_ranking(&mut app, event_id, key, max_pages, top, json, verbose)
        }
        Command::Browse { pages, filter, max_pages, top } => {
            run_browse(&mut app, pages, filter, max_pages, top)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Also installs the log -> tracing bridge for the api crate's `log` records.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn apply_overrides(mut settings: AppSettings, cli: &Cli) -> AppSettings {
    if let Some(url) = &cli.base_url {
        settings.api.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        settings.api.timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(ms) = cli.pacing_ms {
        settings.api.pacing = Duration::from_millis(ms);
    }
    settings
}

fn run_events(app: &mut App, pages: u32, filter: EventFilter, json: bool) -> anyhow::Result<ExitCode> {
    let listing = app.load_events(pages, filter);
    if json {
        println!("{}", serde_json::to_string_pretty(listing)?);
    } else {
        eprintln!("{}", render::listing_summary(listing));
        print!("{}", render::events_table(&listing.events));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_ranking(
    app: &mut App,
    event_id: i64,
    key: Option<String>,
    max_pages: u32,
    top: usize,
    json: bool,
    verbose: bool,
) -> anyhow::Result<ExitCode> {
    let event = showroom_api::EventDescriptor {
        event_id,
        event_name: String::new(),
        event_key: key,
        started_at: None,
        ended_at: None,
        type_name: None,
    };
    let result = app.resolve(event, max_pages);
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_result(result, top, verbose);
    }
    Ok(exit_code(result))
}

fn run_browse(
    app: &mut App,
    pages: u32,
    filter: EventFilter,
    max_pages: u32,
    top: usize,
) -> anyhow::Result<ExitCode> {
    let listing = app.load_events(pages, filter);
    eprintln!("{}", render::listing_summary(listing));
    print!("{}", render::events_table(&listing.events));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        print!("event # to resolve, r to reload, blank to quit: ");
        io::stdout().flush().context("could not write prompt")?;

        let mut line = String::new();
        if input.read_line(&mut line).context("could not read selection")? == 0 {
            break;
        }
        let choice = line.trim();
        if choice.is_empty() {
            break;
        }
        if choice.eq_ignore_ascii_case("r") {
            let listing = app.load_events(pages, filter);
            eprintln!("{}", render::listing_summary(listing));
            print!("{}", render::events_table(&listing.events));
            continue;
        }

        let Ok(index) = choice.parse::<usize>() else {
            eprintln!("not a row number: {choice}");
            continue;
        };
        if app.resolve_selected(index, max_pages).is_none() {
            eprintln!("no event at row {index}");
            continue;
        }
        if let Some(view) = &app.state.last_ranking {
            println!("{}", view.event.choice_label());
            print_result(&view.result, top, false);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_result(result: &ProbeResult, top: usize, verbose: bool) {
    match result {
        ProbeResult::Found(ranking) => print!("{}", render::ranking_table(ranking, top)),
        ProbeResult::Failed(failure) => eprint!("{}", render::failure_report(failure, verbose)),
    }
}

fn exit_code(result: &ProbeResult) -> ExitCode {
    if result.is_found() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
