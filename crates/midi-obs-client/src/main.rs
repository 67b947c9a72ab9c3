//! MIDI-OBS command-line entry point.
//!
//! Connects to OBS, waits for the handshake and the first scene list, then
//! prints which scenes exist, which notes are bound to them, and which scene
//! is the next one free to map.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse() + load_config()   -- flag > env > config file > default
//!  └─ load_action_map()              -- optional note mapping
//!  └─ ObsClient::connect()           -- spawns the socket reactor
//!  └─ wait_until_ready()             -- watch channel: Connected + scenes, or Error
//!  └─ print_report()                 -- text table or JSON envelope
//!  └─ --watch: refresh every few seconds until Ctrl-C or Error
//! ```
//!
//! The process exits non-zero whenever the connection ends in `Error`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use midi_obs_client::application::connection_state::{ConnectionSnapshot, ConnectionStatus};
use midi_obs_client::infrastructure::network::ObsClient;
use midi_obs_client::infrastructure::storage::{load_action_map, load_config, AppConfig, ObsSection};
use midi_obs_client::infrastructure::ui_bridge::{get_obs_status, ObsStatusDto};
use midi_obs_core::protocol::messages::request_types;
use midi_obs_core::ActionMap;

/// How often `--watch` re-reads the scene list.
const WATCH_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Extra time allowed for the socket and handshake on top of the request timeout.
const HANDSHAKE_ALLOWANCE: Duration = Duration::from_secs(5);

/// How long to wait for the first scene list.  Bounded even when requests
/// never time out, so a lost `GetSceneList` cannot stall startup.
fn ready_limit(request_timeout: Option<Duration>) -> Duration {
    request_timeout.map_or(HANDSHAKE_ALLOWANCE, |t| t + HANDSHAKE_ALLOWANCE)
}

#[derive(Debug, Parser)]
#[command(name = "midi-obs", version, about = "Inspect OBS scenes for MIDI note mapping")]
struct Cli {
    /// OBS WebSocket host.
    #[arg(long, env = "OBS_HOST")]
    host: Option<String>,

    /// OBS WebSocket port.
    #[arg(long, env = "OBS_PORT")]
    port: Option<u16>,

    /// OBS WebSocket password.
    #[arg(long, env = "OBS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// TOML config file.
    #[arg(long, env = "MIDI_OBS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON note mapping (note key -> action).
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Per-request timeout in milliseconds; 0 disables it.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Scene index to start looking for an unassigned scene from.
    #[arg(long, default_value_t = 0)]
    start_index: usize,

    /// Print the status as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Keep running and print the status whenever it changes.
    #[arg(long)]
    watch: bool,
}

impl Cli {
    /// Layers command-line and environment values over the config file.
    fn obs_section(&self, file: ObsSection) -> ObsSection {
        ObsSection {
            host: self.host.clone().unwrap_or(file.host),
            port: self.port.unwrap_or(file.port),
            password: self.password.clone().unwrap_or(file.password),
            request_timeout_ms: self.timeout_ms.unwrap_or(file.request_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    // Initialise structured logging.  RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("MIDI-OBS starting");

    let obs = cli.obs_section(config.obs);
    let entries = match &cli.mapping {
        Some(path) => load_action_map(path)
            .with_context(|| format!("loading mapping {}", path.display()))?,
        None => ActionMap::new(),
    };

    let client_config = obs.client_config();
    let ready_timeout = ready_limit(client_config.request_timeout);
    let client = ObsClient::new(client_config);
    let mut updates = client.subscribe();
    client.connect(&obs.host, obs.port);

    if let Err(e) = wait_until_ready(&mut updates, ready_timeout).await {
        client.disconnect();
        return Err(e);
    }
    log_obs_version(&client).await;

    let mut last = print_report(&client, &entries, &cli)?;
    if cli.watch {
        let outcome = watch_status(&client, &mut updates, &entries, &cli, &mut last).await;
        client.disconnect();
        outcome?;
    } else {
        client.disconnect();
    }

    info!("MIDI-OBS stopped");
    Ok(())
}

/// Waits for `Connected` with a scene list, or for the attempt to fail.
///
/// A connection that is up but still has no scenes when `limit` runs out is
/// accepted as-is; anything else that runs out the clock is an error.
async fn wait_until_ready(
    updates: &mut watch::Receiver<ConnectionSnapshot>,
    limit: Duration,
) -> anyhow::Result<()> {
    let wait = async {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            match snapshot.status {
                ConnectionStatus::Error => bail!("{}", snapshot.error),
                ConnectionStatus::Disconnected => bail!("OBS closed the connection"),
                ConnectionStatus::Connected if !snapshot.scenes.is_empty() => return Ok(()),
                _ => {}
            }
            updates
                .changed()
                .await
                .context("connection state channel closed")?;
        }
    };

    let outcome = tokio::time::timeout(limit, wait).await;
    match outcome {
        Ok(result) => result,
        Err(_) if updates.borrow().status == ConnectionStatus::Connected => {
            warn!("connected, but the scene list did not arrive in time");
            Ok(())
        }
        Err(_) => bail!("timed out after {limit:?} waiting for OBS"),
    }
}

async fn log_obs_version(client: &ObsClient) {
    let Some(version) = client.send_request(request_types::GET_VERSION).await else {
        debug!("GetVersion returned no data");
        return;
    };
    let field = |name: &str| version.get(name).and_then(|v| v.as_str()).unwrap_or("?").to_string();
    info!(
        "OBS {} with obs-websocket {}",
        field("obsVersion"),
        field("obsWebSocketVersion")
    );
}

/// Prints the current status and returns what was printed.
fn print_report(
    client: &ObsClient,
    entries: &ActionMap,
    cli: &Cli,
) -> anyhow::Result<Option<ObsStatusDto>> {
    let result = get_obs_status(client, entries, cli.start_index);
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serializing status")?
        );
    } else {
        match (&result.data, &result.error) {
            (Some(status), _) => print_table(status),
            (None, Some(error)) => println!("OBS: error: {error}"),
            (None, None) => {}
        }
    }
    Ok(result.data)
}

fn print_table(status: &ObsStatusDto) {
    println!("OBS: {:?} ({} scenes)", status.status, status.scenes.len());
    let width = status.scenes.iter().map(|row| row.name.len()).max().unwrap_or(0);
    for (idx, row) in status.scenes.iter().enumerate() {
        println!(
            "  {idx:>3}  {:<width$}  {}",
            row.name,
            row.assigned_notes.join(", ")
        );
    }
    match &status.next_unassigned {
        Some(scene) => println!("next unassigned: {scene}"),
        None => println!("next unassigned: none"),
    }
    for row in &status.loops {
        let tick = row
            .tick_ms
            .map_or_else(|| "no tempo".to_string(), |ms| format!("{ms} ms"));
        println!(
            "loop {} {} ({}, {tick}): {}",
            row.note,
            row.prefix,
            row.style,
            row.scenes.join(" -> ")
        );
    }
}

/// Re-reads the scene list periodically and prints every change until
/// Ctrl-C, a clean close, or an error.
async fn watch_status(
    client: &ObsClient,
    updates: &mut watch::Receiver<ConnectionSnapshot>,
    entries: &ActionMap,
    cli: &Cli,
    last: &mut Option<ObsStatusDto>,
) -> anyhow::Result<()> {
    let mut refresh = tokio::time::interval(WATCH_REFRESH_INTERVAL);
    refresh.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
            _ = refresh.tick() => {
                if !client.refresh_scenes().await {
                    debug!("scene refresh failed; keeping the previous list");
                }
            }
            changed = updates.changed() => {
                changed.context("connection state channel closed")?;
                let snapshot = updates.borrow_and_update().clone();
                match snapshot.status {
                    ConnectionStatus::Error => bail!("{}", snapshot.error),
                    ConnectionStatus::Disconnected => bail!("OBS closed the connection"),
                    _ => {}
                }
                let current = get_obs_status(client, entries, cli.start_index).data;
                if current != *last {
                    info!("status {:?} ({} scenes)", snapshot.status, snapshot.scenes.len());
                    *last = print_report(client, entries, cli)?;
                }
            }
        }
    }
}
