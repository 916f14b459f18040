//! CLI arguments for procwatch.
//!
//! This module defines the command-line interface structure using the clap
//! library, including all flags and options.

use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procwatch",
    about = "Process table monitor with edge-triggered CPU/memory high-load alerting",
    long_about = "Process table monitor with edge-triggered CPU/memory high-load alerting.\n\n\
                  Periodically samples the running-process table, derives per-process CPU and \
                  memory utilization, and serves the live view over HTTP. When system-wide CPU \
                  or memory usage crosses its threshold, a single alert event is pushed to all \
                  WebSocket subscribers; a second event follows when the load falls back.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Settling pause between the two processor-time readings of a cycle (ms)
    #[arg(long)]
    pub settle_interval_ms: Option<u64>,

    /// Aggregate CPU percentage above which the CPU high-load alert fires
    #[arg(long)]
    pub cpu_threshold: Option<f64>,

    /// Fraction of total memory above which the memory high-load alert fires
    #[arg(long)]
    pub memory_threshold: Option<f64>,

    /// Root of the proc filesystem to sample (mainly for testing)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}
