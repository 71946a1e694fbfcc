//! Headless companion for the LIDAR hub.
//!
//! `watch` runs the browser client's Store and Transport over a native
//! WebSocket and prints the status line; the remaining subcommands call the
//! hub's REST surface directly and print the JSON they get back.

mod watch;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::io::{self, Read};

use clap::{Args, Parser, Subcommand, ValueEnum};
use client::config::ClientConfig;
use client::features::form::ValidationError;
use client::features::{configs, dbscan, sinks};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use wire::rest::{self, ConfigList, ConfigName, ConfigOp, NewSensor};
use wire::{DbscanConfig, SensorId, SensorMode, SensorPatch, Sink, SinkId};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket failed: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("live channel gave up after {0} attempts")]
    GaveUp(u32),
    #[error("message decode failed: {0}")]
    Decode(#[from] wire::CodecError),
    #[error("hub returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("read input failed: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    fn ws(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }

    fn from_validation(errors: &[ValidationError]) -> Option<Self> {
        errors.first().map(|e| Self::Invalid(e.to_string()))
    }
}

#[derive(Parser, Debug)]
#[command(name = "lidar-hub", about = "LIDAR hub live monitor and REST CLI")]
struct Cli {
    #[arg(long, env = "LIDAR_HUB_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the REST snapshot to check the hub is reachable.
    Ping,
    /// Follow the live channel and print the status line.
    Watch(WatchArgs),
    Sensors(SensorsCommand),
    Sinks(SinksCommand),
    Configs(ConfigsCommand),
    Filters(FiltersCommand),
    Dbscan(DbscanCommand),
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, default_value_t = client::config::DEFAULT_STATS_REFRESH_MS)]
    interval_ms: u32,

    #[arg(long, help = "Stop after this many seconds")]
    seconds: Option<u64>,

    #[arg(long, default_value_t = client::config::DEFAULT_MAX_RECONNECT_ATTEMPTS)]
    max_attempts: u32,

    #[arg(long, default_value_t = false, help = "Exit on the first message that fails to decode")]
    strict: bool,
}

#[derive(Args, Debug)]
struct SensorsCommand {
    #[command(subcommand)]
    command: SensorsSubcommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Me,
    Md,
}

impl From<ModeArg> for SensorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Me => SensorMode::ME,
            ModeArg::Md => SensorMode::MD,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SensorsSubcommand {
    List,
    Get {
        id: String,
    },
    Add {
        #[arg(long = "type", default_value = "hokuyo_urg_eth")]
        kind: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = rest::DEFAULT_SENSOR_HOST)]
        host: String,
        #[arg(long, default_value_t = rest::DEFAULT_SENSOR_PORT)]
        port: u16,
        #[arg(long, value_enum, default_value = "me")]
        mode: ModeArg,
        #[arg(long, default_value_t = false)]
        disabled: bool,
    },
    Enable {
        id: String,
    },
    Disable {
        id: String,
    },
    /// Apply a JSON patch such as `{"pose":{"tx":1.0}}`.
    Patch {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct SinksCommand {
    #[command(subcommand)]
    command: SinksSubcommand,
}

#[derive(Subcommand, Debug)]
enum SinksSubcommand {
    List,
    Add {
        #[arg(long, default_value_t = false)]
        osc: bool,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        rate_limit: Option<u32>,
    },
    /// Replace a sink with the JSON record in `--data`.
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ConfigsCommand {
    #[command(subcommand)]
    command: ConfigsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConfigsSubcommand {
    List,
    Save {
        #[arg(default_value = configs::DEFAULT_CONFIG_NAME)]
        name: String,
    },
    /// Load by name or by 1-based position in the list.
    Load {
        choice: String,
    },
    Export,
    Import {
        #[arg(default_value = "-", help = "YAML file path, or - for stdin")]
        input: String,
    },
}

#[derive(Args, Debug)]
struct FiltersCommand {
    #[command(subcommand)]
    command: FiltersSubcommand,
}

#[derive(Subcommand, Debug)]
enum FiltersSubcommand {
    Get,
}

#[derive(Args, Debug)]
struct DbscanCommand {
    #[command(subcommand)]
    command: DbscanSubcommand,
}

#[derive(Subcommand, Debug)]
enum DbscanSubcommand {
    Get,
    Set {
        #[arg(long)]
        data: String,
    },
}

/// Request body for [`api_request`].
enum Payload {
    Empty,
    Json(Value),
    Yaml(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let base_url = cli.base_url.trim_end_matches('/').to_owned();

    match cli.command {
        Command::Ping => run_ping(&base_url).await,
        Command::Watch(args) => watch::run(&base_url, args).await,
        Command::Sensors(sensors) => run_sensors(&base_url, sensors.command).await,
        Command::Sinks(sinks) => run_sinks(&base_url, sinks.command).await,
        Command::Configs(configs) => run_configs(&base_url, configs.command).await,
        Command::Filters(filters) => match filters.command {
            FiltersSubcommand::Get => print_request(&base_url, reqwest::Method::GET, &rest::filters_path(), Payload::Empty).await,
        },
        Command::Dbscan(dbscan) => run_dbscan(&base_url, dbscan.command).await,
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let body = api_request(base_url, reqwest::Method::GET, &rest::snapshot_path(), Payload::Empty).await?;
    let snapshot: Value = serde_json::from_str(&body)?;
    let sensors = snapshot.get("sensors").and_then(Value::as_array).map_or(0, Vec::len);
    println!("ok ({sensors} sensors)");
    Ok(())
}

async fn run_sensors(base_url: &str, command: SensorsSubcommand) -> Result<(), CliError> {
    match command {
        SensorsSubcommand::List => print_request(base_url, reqwest::Method::GET, &rest::sensors_path(), Payload::Empty).await,
        SensorsSubcommand::Get { id } => {
            let path = rest::sensor_path(&sensor_id(&id)?);
            print_request(base_url, reqwest::Method::GET, &path, Payload::Empty).await
        }
        SensorsSubcommand::Add { kind, name, host, port, mode, disabled } => {
            let sensor = NewSensor::from_form(&kind, &name, &host, port, mode.into(), !disabled);
            let body = Payload::Json(serde_json::to_value(&sensor)?);
            print_request(base_url, reqwest::Method::POST, &rest::sensors_path(), body).await
        }
        SensorsSubcommand::Enable { id } => patch_sensor(base_url, &id, enabled_patch(true)).await,
        SensorsSubcommand::Disable { id } => patch_sensor(base_url, &id, enabled_patch(false)).await,
        SensorsSubcommand::Patch { id, data } => {
            let patch: SensorPatch = serde_json::from_str(&data)?;
            patch_sensor(base_url, &id, patch).await
        }
        SensorsSubcommand::Delete { id } => {
            let path = rest::sensor_path(&sensor_id(&id)?);
            print_request(base_url, reqwest::Method::DELETE, &path, Payload::Empty).await
        }
    }
}

async fn patch_sensor(base_url: &str, id: &str, patch: SensorPatch) -> Result<(), CliError> {
    let path = rest::sensor_path(&sensor_id(id)?);
    let body = Payload::Json(serde_json::to_value(&patch)?);
    print_request(base_url, reqwest::Method::PATCH, &path, body).await
}

fn enabled_patch(enabled: bool) -> SensorPatch {
    SensorPatch { enabled: Some(enabled), ..SensorPatch::default() }
}

fn sensor_id(id: &str) -> Result<SensorId, CliError> {
    let id = SensorId::new(id.trim());
    if id.is_empty() {
        return Err(CliError::Invalid("sensor id must not be empty".to_owned()));
    }
    Ok(id)
}

async fn run_sinks(base_url: &str, command: SinksSubcommand) -> Result<(), CliError> {
    match command {
        SinksSubcommand::List => {
            let body = api_request(base_url, reqwest::Method::GET, &rest::sinks_path(), Payload::Empty).await?;
            let list: Vec<Sink> = serde_json::from_str(&body)?;
            for (position, sink) in list.iter().enumerate() {
                println!("{}\t{}\t{}", sink.address(position), on_off(sink.enabled), sinks::summary(sink));
            }
            Ok(())
        }
        SinksSubcommand::Add { osc, url, topic, rate_limit } => {
            let sink = sink_from_args(osc, url, topic, rate_limit)?;
            let body = Payload::Json(serde_json::to_value(&sink)?);
            print_request(base_url, reqwest::Method::POST, &rest::sinks_path(), body).await
        }
        SinksSubcommand::Update { id, data } => {
            let sink: Sink = serde_json::from_str(&data)?;
            if let Some(error) = CliError::from_validation(&sinks::validate(&sink)) {
                return Err(error);
            }
            let body = Payload::Json(serde_json::to_value(&sink)?);
            let path = rest::sink_path(&SinkId(id));
            print_request(base_url, reqwest::Method::PATCH, &path, body).await
        }
        SinksSubcommand::Delete { id } => {
            let path = rest::sink_path(&SinkId(id));
            print_request(base_url, reqwest::Method::DELETE, &path, Payload::Empty).await
        }
    }
}

/// New sink from the transport template, overridden by the given flags.
fn sink_from_args(osc: bool, url: Option<String>, topic: Option<String>, rate_limit: Option<u32>) -> Result<Sink, CliError> {
    let mut sink = Sink::template(osc);
    if let Some(url) = url {
        sink.url = url;
    }
    if let Some(topic) = topic {
        sink.topic = topic;
    }
    if let Some(rate_limit) = rate_limit {
        sink.rate_limit = rate_limit;
    }
    match CliError::from_validation(&sinks::validate(&sink)) {
        Some(error) => Err(error),
        None => Ok(sink),
    }
}

async fn run_configs(base_url: &str, command: ConfigsSubcommand) -> Result<(), CliError> {
    match command {
        ConfigsSubcommand::List => {
            for (n, file) in list_configs(base_url).await?.iter().enumerate() {
                println!("{}\t{}", n + 1, file.name);
            }
            Ok(())
        }
        ConfigsSubcommand::Save { name } => {
            let body = Payload::Json(serde_json::to_value(ConfigName::normalized(&name))?);
            print_request(base_url, reqwest::Method::POST, &rest::configs_path(ConfigOp::Save), body).await
        }
        ConfigsSubcommand::Load { choice } => {
            let files = list_configs(base_url).await?;
            let name = rest::resolve_config_choice(&files, &choice)
                .map(|file| file.name.clone())
                .ok_or_else(|| CliError::Invalid(format!("Configuration \"{}\" not found", choice.trim())))?;
            let body = Payload::Json(serde_json::to_value(ConfigName::normalized(&name))?);
            print_request(base_url, reqwest::Method::POST, &rest::configs_path(ConfigOp::Load), body).await
        }
        ConfigsSubcommand::Export => {
            let yaml = api_request(base_url, reqwest::Method::GET, &rest::configs_path(ConfigOp::Export), Payload::Empty).await?;
            print!("{yaml}");
            Ok(())
        }
        ConfigsSubcommand::Import { input } => {
            let yaml = read_input(&input)?;
            if let Some(first) = configs::validate_yaml(&yaml).into_iter().next() {
                return Err(CliError::Invalid(first));
            }
            print_request(base_url, reqwest::Method::POST, &rest::configs_path(ConfigOp::Import), Payload::Yaml(yaml)).await
        }
    }
}

async fn list_configs(base_url: &str) -> Result<Vec<rest::ConfigFile>, CliError> {
    let body = api_request(base_url, reqwest::Method::GET, &rest::configs_path(ConfigOp::List), Payload::Empty).await?;
    let list: ConfigList = serde_json::from_str(&body)?;
    Ok(list.into_files())
}

async fn run_dbscan(base_url: &str, command: DbscanSubcommand) -> Result<(), CliError> {
    match command {
        DbscanSubcommand::Get => print_request(base_url, reqwest::Method::GET, &rest::dbscan_path(), Payload::Empty).await,
        DbscanSubcommand::Set { data } => {
            let config: DbscanConfig = serde_json::from_str(&data)?;
            if let Some(error) = CliError::from_validation(&dbscan::validate(&config)) {
                return Err(error);
            }
            let body = Payload::Json(serde_json::to_value(config)?);
            print_request(base_url, reqwest::Method::PUT, &rest::dbscan_path(), body).await
        }
    }
}

/// Absolute URL for a `wire::rest` path.
fn api_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Live-channel URL for the hub at `base_url`.
fn live_url(base_url: &str, config: &ClientConfig) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(host) = base.strip_prefix("https://") {
        return Ok(config.live_url("https:", host));
    }
    if let Some(host) = base.strip_prefix("http://") {
        return Ok(config.live_url("http:", host));
    }
    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

async fn api_request(base_url: &str, method: reqwest::Method, path: &str, body: Payload) -> Result<String, CliError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(u64::from(client::config::DEFAULT_REQUEST_TIMEOUT_MS)))
        .build()?;
    let url = api_url(base_url, path);
    tracing::debug!(%method, %url, "request");

    let request = client.request(method, &url);
    let request = match body {
        Payload::Empty => request,
        Payload::Json(json) => request.json(&json),
        Payload::Yaml(text) => request.header(reqwest::header::CONTENT_TYPE, "text/yaml").body(text),
    };

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(CliError::ServerError {
            status: status.as_u16(),
            message: rest::error_message(status.as_u16(), &text),
        });
    }
    Ok(text)
}

async fn print_request(base_url: &str, method: reqwest::Method, path: &str, body: Payload) -> Result<(), CliError> {
    let text = api_request(base_url, method, path, body).await?;
    println!("{}", render_body(&text)?);
    Ok(())
}

/// Pretty-print a JSON body; empty bodies print as `ok`.
fn render_body(text: &str) -> Result<String, CliError> {
    if text.trim().is_empty() {
        return Ok("ok".to_owned());
    }
    let value: Value = serde_json::from_str(text)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn read_input(input: &str) -> Result<String, CliError> {
    let mut text = String::new();
    if input == "-" {
        io::stdin().read_to_string(&mut text)?;
    } else {
        text = std::fs::read_to_string(input)?;
    }
    Ok(text)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
