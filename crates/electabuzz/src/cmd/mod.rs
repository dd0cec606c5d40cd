use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use electabuzz_client::{ClientConfig, Connection};
use electabuzz_transport::DEFAULT_PORT;
use electabuzz_value::DataType;

use crate::exit::{client_error, CliResult};
use crate::output::OutputFormat;

pub mod bridge;
pub mod clients;
pub mod ping;
pub mod read;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one or more datapoints.
    Read(ReadArgs),
    /// Write a value to one datapoint.
    Write(WriteArgs),
    /// List the clients attached to the multiplexer.
    Clients(ClientsArgs),
    /// Measure the round-trip time to the multiplexer.
    Ping(PingArgs),
    /// Serve the line-based text bridge over TCP.
    Bridge(BridgeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, target: TargetArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, &target, format).await,
        Command::Write(args) => write::run(args, &target, format).await,
        Command::Clients(args) => clients::run(args, &target, format).await,
        Command::Ping(args) => ping::run(args, &target, format).await,
        Command::Bridge(args) => bridge::run(args, &target).await,
        Command::Version(args) => version::run(args),
    }
}

/// Where the multiplexer lives and how patiently to talk to it.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Multiplexer host name or address.
    #[arg(long, env = "EB_HOST", default_value = "mps.local", global = true)]
    pub host: String,
    /// Multiplexer UDP port.
    #[arg(long, env = "EB_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,
    /// Time to wait for each response (e.g. 500, 750ms, 2s; bare numbers are milliseconds).
    #[arg(
        long,
        env = "EB_RECV_TIMEOUT_MS",
        default_value = "500",
        value_parser = parse_duration,
        global = true
    )]
    pub recv_timeout: Duration,
    /// Attempts per exchange (default: 3).
    #[arg(long, global = true)]
    pub attempts: Option<u32>,
}

impl TargetArgs {
    pub fn config(&self) -> ClientConfig {
        let config = ClientConfig::with_recv_timeout(self.recv_timeout);
        match self.attempts {
            Some(attempts) => config.with_attempts(attempts),
            None => config,
        }
    }

    pub async fn connect(&self) -> CliResult<Connection> {
        Connection::connect(&self.host, self.port, self.config())
            .await
            .map_err(|err| client_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Datapoint ids in hex (e.g. 3107 or 0x3107).
    #[arg(required = true, value_parser = parse_datapoint_id)]
    pub ids: Vec<u64>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Datapoint id in hex (e.g. 3107 or 0x3107).
    #[arg(value_parser = parse_datapoint_id)]
    pub id: u64,
    /// Value(s) to write. Several values are written as an array.
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<String>,
    /// Declared type of the datapoint (e.g. double, float, uint16, bool).
    #[arg(long = "type", short = 't', default_value = "double")]
    pub data_type: DataType,
}

#[derive(Args, Debug, Default)]
pub struct ClientsArgs {}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Number of pings to send.
    #[arg(long, short = 'c', default_value_t = 1)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Address to accept text clients on.
    #[arg(long, default_value = "0.0.0.0:5050")]
    pub listen: SocketAddr,
    /// JSON file mapping datapoint ids to types, e.g. {"0x3107": "bool"}.
    #[arg(long, value_name = "FILE")]
    pub type_map: Option<PathBuf>,
    /// Connection verification attempts before giving up.
    #[arg(long, default_value_t = 3)]
    pub verify_attempts: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a datapoint id written in hex, with or without a `0x` prefix.
///
/// Range checking is left to the client so that oversized ids are reported
/// with the protocol's result codes.
pub fn parse_datapoint_id(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|_| format!("invalid hex datapoint id: {input}"))
}

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    match unit {
        "s" => Ok(Duration::from_secs(value)),
        _ => Ok(Duration::from_millis(value)),
    }
}
