//! RISE EDR driver
//!
//! Runs one EDR location query against the RISE API and prints the
//! resulting GeoJSON (or OGC exception) to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rise_client::{CachingFetcher, RiseClient};
use rise_edr::{LocationQueryParams, LocationResolver};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use rise_edr_cli::{execute, render_error, Command, DriverConfig};

/// RISE EDR driver
#[derive(Parser, Debug)]
#[command(name = "rise-edr")]
#[command(about = "OGC API - Environmental Data Retrieval location queries over the RISE API")]
struct Args {
    /// YAML config file (defaults to RISE_* environment variables)
    #[arg(short, long, env = "RISE_EDR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the upstream base URL
    #[arg(long, env = "RISE_BASE_URL")]
    base_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "RISE_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Bypass cached upstream responses
    #[arg(long)]
    force_fetch: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Query all locations
    Locations(QueryArgs),
    /// Query one location by id
    Location {
        id: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List known parameters
    Parameters,
}

#[derive(clap::Args, Debug)]
struct QueryArgs {
    /// Parameter name(s) or id(s), comma-separated
    #[arg(long = "parameter-name")]
    parameter_name: Option<String>,

    /// minx,miny,maxx,maxy or minx,miny,minz,maxx,maxy,maxz
    #[arg(long)]
    bbox: Option<String>,

    /// Datetime instant, list or interval
    #[arg(long)]
    datetime: Option<String>,

    /// Elevation: single, list, range or R<count>/<start>/<step>
    #[arg(long)]
    z: Option<String>,

    #[arg(long)]
    limit: Option<String>,

    #[arg(long)]
    offset: Option<String>,
}

impl From<QueryArgs> for LocationQueryParams {
    fn from(args: QueryArgs) -> Self {
        Self {
            parameter_name: args.parameter_name,
            bbox: args.bbox,
            datetime: args.datetime,
            z: args.z,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Locations(query) => Command::Locations(query.into()),
            CliCommand::Location { id, query } => Command::Location {
                id,
                params: query.into(),
            },
            CliCommand::Parameters => Command::Parameters,
        }
    }
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .expect("Failed to create Tokio runtime");

    let code = runtime.block_on(async move {
        match run(args).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                2
            }
        }
    });

    std::process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    // Initialize tracing; stdout is reserved for the result document
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let mut config = DriverConfig::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }

    info!(base_url = %config.client.base_url, "Starting RISE EDR query");

    let client = RiseClient::new(config.client.clone()).context("Failed to create HTTP client")?;
    let fetcher = Arc::new(
        CachingFetcher::new(client, config.resolver.cache_ttl()).force_fetch(args.force_fetch),
    );
    let resolver = LocationResolver::new(fetcher, config.resolver.clone());

    let command = Command::from(args.command);
    let (body, code) = match execute(&resolver, &command).await {
        Ok(body) => (body, 0),
        Err(e) => {
            warn!(status = e.status_code(), "Query failed: {}", e);
            (render_error(&e), 1)
        }
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&body)
    } else {
        serde_json::to_string(&body)
    }
    .context("Failed to serialize output")?;

    println!("{}", output);
    Ok(code)
}
