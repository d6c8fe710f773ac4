use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use relay::replay::{ReplayFrame, ReplayOutcome};
use relay::util::{self, parse_time_arg};
use relay::{
    materialize, Config, HttpIngestSink, ReplayEngine, SanitizationRules, Sanitizer,
    ScenarioStore, SearchClient, SearchQuery, SearchTarget, WebAppState,
};

#[derive(Debug, Parser)]
#[command(
    name = "relay",
    version,
    about = "Capture, sanitize and replay timestamped event scenarios"
)]
struct Cli {
    /// Data directory (default ~/.relay)
    #[arg(long, env = "RELAY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Append logs to <data-dir>/logs/relay.log instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Search a remote site and store the sanitized result as a scenario
    Capture(CaptureArgs),
    /// Replay a stored scenario into an ingestion endpoint
    Replay(ReplayArgs),
    /// Print the progress stream of a replay running on a server
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
struct CaptureArgs {
    /// Scenario name to store under
    name: String,

    /// Free-text search
    #[arg(short = 'q', long, default_value = "")]
    search: String,

    /// Window start (epoch ms or RFC 3339)
    #[arg(long, value_parser = parse_time_arg)]
    start: i64,

    /// Window end (epoch ms or RFC 3339)
    #[arg(long, value_parser = parse_time_arg)]
    end: i64,

    #[arg(long, env = "RELAY_SITE", default_value = "")]
    site: String,

    #[arg(long, env = "RELAY_SEARCH_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    #[arg(long)]
    grid_account: Option<String>,

    /// JSON file with sanitization rules, replacing the configured defaults
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Replace an existing scenario with the same name
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Stored scenario name or path to an artifact
    scenario: String,

    #[arg(long, env = "RELAY_INGEST_URL")]
    endpoint: String,

    #[arg(long, env = "RELAY_INGEST_TOKEN", default_value = "", hide_env_values = true)]
    token: String,
}

#[derive(Debug, Args)]
struct WatchArgs {
    /// Replay id returned when the replay was started
    id: Uuid,

    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());
    init_tracing(cli.log_file)?;

    match cli.command {
        Command::Serve { host, port } => serve(host, port).await,
        Command::Capture(args) => capture(args).await,
        Command::Replay(args) => replay(args).await,
        Command::Watch(args) => watch(args).await,
    }
}

fn init_tracing(to_file: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if to_file {
        fs::create_dir_all(util::logs_dir())?;
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(util::log_file_path())?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(log_file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = Config::load().with_bind(host, port);
    let state = WebAppState::new(config, ScenarioStore::open_default())?;
    relay::run_server(state).await
}

async fn capture(args: CaptureArgs) -> Result<()> {
    let config = Config::load();
    let store = ScenarioStore::open_default();
    let name = ScenarioStore::normalize_name(&args.name)?;
    if !args.overwrite && store.exists(&name)? {
        bail!("scenario `{name}` already exists (use --overwrite)");
    }

    let rules = match &args.rules {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading rules from {}", path.display()))?;
            serde_json::from_str::<SanitizationRules>(&text)
                .with_context(|| format!("parsing rules from {}", path.display()))?
        }
        None => config.sanitize.clone(),
    };

    let mut target = SearchTarget::new(args.site, args.token);
    if let Some(account) = args.grid_account {
        target = target.with_grid_account(account);
    }
    let query = SearchQuery::new(args.search, args.start, args.end);

    let client = SearchClient::new(&config.search)?;
    let mut hits = client.fetch(&target, &query).await?;
    Sanitizer::new(&rules).apply_all(&mut hits);

    let scenario = materialize(hits);
    let path = store.save(&name, &scenario, args.overwrite)?;

    println!(
        "{name}: {} records ({} skipped) -> {}",
        scenario.len(),
        scenario.skipped(),
        path.display()
    );
    Ok(())
}

async fn replay(args: ReplayArgs) -> Result<()> {
    let config = Config::load();
    let path = ScenarioStore::open_default().resolve(&args.scenario)?;
    let sink = HttpIngestSink::new(&args.endpoint, &args.token, &config.ingest)?;

    let (tx, mut rx) = mpsc::channel(config.replay.channel_capacity);
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "unprintable frame"),
            }
        }
    });

    let engine = ReplayEngine::new(Arc::new(sink));
    let summary = engine.run(&path, tx, cancel).await;
    printer.await?;

    match summary.status {
        ReplayOutcome::Completed => Ok(()),
        ReplayOutcome::Cancelled => bail!("replay cancelled after {} records", summary.delivered),
        ReplayOutcome::Failed => bail!(
            "replay failed: {}",
            summary.error.unwrap_or_else(|| "unknown error".into())
        ),
    }
}

async fn watch(args: WatchArgs) -> Result<()> {
    let url = format!(
        "{}/api/replay/{}/progress",
        args.server.trim_end_matches('/'),
        args.id
    );
    let mut events: EventSource = reqwest::Client::new()
        .get(&url)
        .eventsource()
        .with_context(|| format!("connecting to {url}"))?;

    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => tracing::debug!(%url, "progress stream open"),
            Ok(Event::Message(msg)) => {
                println!("{}", msg.data);
                let terminal = serde_json::from_str::<ReplayFrame>(&msg.data)
                    .map(|frame| frame.is_terminal())
                    .unwrap_or(false);
                if terminal {
                    events.close();
                    break;
                }
            }
            Err(reqwest_eventsource::Error::StreamEnded) => {
                events.close();
                break;
            }
            Err(e) => {
                events.close();
                bail!("progress stream failed: {e}");
            }
        }
    }
    Ok(())
}
