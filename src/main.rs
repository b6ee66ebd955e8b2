mod config;
mod render;
mod state;

use crate::config::Config;
use crate::state::messages::{LookupRequest, LookupResponse};
use crate::state::worker::LookupWorker;
use anyhow::Context;
use clap::Parser;
use log::debug;
use mtcareers::{SheetSession, UserResolver};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Print MT Career title cards from the community statistics spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "mttitlecard", version, about, after_help = ENV_HELP)]
struct Cli {
    /// Players to look up (case-insensitive)
    #[arg(value_name = "USERNAME", required_unless_present = "warm")]
    usernames: Vec<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print one JSON object per line instead of title cards
    #[arg(long)]
    json: bool,

    /// Only read the entrant totals and print them
    #[arg(long)]
    warm: bool,

    /// Log lookups and fetches to stderr
    #[arg(short, long)]
    verbose: bool,
}

const ENV_HELP: &str = "Environment:
  MTTITLECARD_API_KEY         Google API key for a publicly readable sheet
  MTTITLECARD_ACCESS_TOKEN    OAuth access token (takes precedence over the key)
  MTTITLECARD_SPREADSHEET_ID  Spreadsheet to read instead of the MT Career sheet
  RUST_LOG                    Log filter (default warn)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    better_panic::install();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let api = config.sheets_api().context("failed to set up the Sheets client")?;
    let session = SheetSession::new(api, config.spreadsheet_id.clone());
    let resolver = UserResolver::new(config.layout.clone());

    let (request_tx, request_rx) = mpsc::channel::<LookupRequest>(100);
    let (response_tx, response_rx) = mpsc::channel::<LookupResponse>(100);

    // Lookup thread
    let worker = LookupWorker::new(session, resolver, request_rx, response_tx);
    let worker_task = tokio::spawn(worker.run());

    let mut requests = Vec::with_capacity(cli.usernames.len() + 1);
    if cli.warm {
        requests.push(LookupRequest::Warm);
    }
    requests.extend(
        cli.usernames
            .iter()
            .map(|username| LookupRequest::Resolve { username: username.clone() }),
    );

    for request in requests {
        request_tx
            .send(request)
            .await
            .context("lookup worker stopped unexpectedly")?;
    }
    drop(request_tx);

    let failures = print_responses(response_rx, cli.json).await?;
    worker_task.await.context("lookup worker panicked")?;

    if failures > 0 {
        debug!("{failures} lookups failed");
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints responses as they arrive and returns how many lookups failed.
async fn print_responses(
    mut responses: mpsc::Receiver<LookupResponse>,
    json: bool,
) -> anyhow::Result<usize> {
    let mut failures = 0;
    let mut first = true;

    while let Some(response) = responses.recv().await {
        if response.is_failure() {
            failures += 1;
        }
        match response {
            LookupResponse::Resolved { user } if json => println!("{}", render::json_line(&user)?),
            LookupResponse::Resolved { user } => {
                if !first {
                    println!();
                }
                println!("{}", render::title_card(&user));
            }
            LookupResponse::Warmed { entrants } if json => {
                println!("{}", render::json_line(&entrants)?);
            }
            LookupResponse::Warmed { entrants } => println!("{}", render::entrants_summary(&entrants)),
            LookupResponse::NotFound { username } => {
                eprintln!("mttitlecard: no MT Career record for {username:?}");
            }
            LookupResponse::Error { message } => eprintln!("mttitlecard: {message}"),
        }
        first = false;
    }

    Ok(failures)
}
