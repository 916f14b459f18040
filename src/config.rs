//! Configuration management for procwatch.
//!
//! This module handles loading, merging, and validating configuration from
//! files and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9230;
/// Pause between the pre- and post-query processor-time readings of a cycle.
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 1000;
/// Aggregate CPU percentage above which the CPU high-load latch sets.
pub const DEFAULT_CPU_THRESHOLD_PERCENT: f64 = 80.0;
/// Fraction of total memory above which the memory high-load latch sets.
pub const DEFAULT_MEMORY_THRESHOLD_FRACTION: f64 = 0.8;
/// Buffered alert frames per WebSocket subscriber before it starts lagging.
pub const DEFAULT_ALERT_BUFFER: usize = 64;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Sampling
    #[serde(alias = "settle-interval-ms")]
    pub settle_interval_ms: Option<u64>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Alerting
    #[serde(alias = "cpu-threshold-percent")]
    pub cpu_threshold_percent: Option<f64>,
    #[serde(alias = "memory-threshold-fraction")]
    pub memory_threshold_fraction: Option<f64>,
    #[serde(alias = "alert-buffer")]
    pub alert_buffer: Option<usize>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            settle_interval_ms: Some(DEFAULT_SETTLE_INTERVAL_MS),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            cpu_threshold_percent: Some(DEFAULT_CPU_THRESHOLD_PERCENT),
            memory_threshold_fraction: Some(DEFAULT_MEMORY_THRESHOLD_FRACTION),
            alert_buffer: Some(DEFAULT_ALERT_BUFFER),
            enable_health: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let settle = cfg.settle_interval_ms.unwrap_or(DEFAULT_SETTLE_INTERVAL_MS);
    if settle == 0 {
        return Err("settle_interval_ms must be greater than zero".into());
    }

    let cpu = cfg
        .cpu_threshold_percent
        .unwrap_or(DEFAULT_CPU_THRESHOLD_PERCENT);
    if !(cpu > 0.0 && cpu <= 100.0) {
        return Err(format!(
            "cpu_threshold_percent must be within (0, 100], got {}",
            cpu
        )
        .into());
    }

    let mem = cfg
        .memory_threshold_fraction
        .unwrap_or(DEFAULT_MEMORY_THRESHOLD_FRACTION);
    if !(mem > 0.0 && mem <= 1.0) {
        return Err(format!(
            "memory_threshold_fraction must be within (0, 1], got {}",
            mem
        )
        .into());
    }

    if cfg.alert_buffer == Some(0) {
        return Err("alert_buffer must be greater than zero".into());
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                for (label, path) in [("certificate", cert), ("private key", key)] {
                    match fs::metadata(Path::new(path)) {
                        Ok(meta) if meta.len() == 0 => {
                            return Err(format!("TLS {} file is empty: {}", label, path).into());
                        }
                        Err(e) => {
                            return Err(format!(
                                "TLS {} file is not readable: {} ({})",
                                label, path, e
                            )
                            .into());
                        }
                        Ok(_) => {}
                    }
                }
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if args.settle_interval_ms.is_some() {
        config.settle_interval_ms = args.settle_interval_ms;
    }
    if args.cpu_threshold.is_some() {
        config.cpu_threshold_percent = args.cpu_threshold;
    }
    if args.memory_threshold.is_some() {
        config.memory_threshold_fraction = args.memory_threshold;
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support.
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/procwatch/procwatch.yaml",
            "/etc/procwatch/procwatch.yml",
            "/etc/procwatch/procwatch.json",
            "./procwatch.yaml",
            "./procwatch.yml",
            "./procwatch.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_zero_settle_interval_rejected() {
        let cfg = Config {
            settle_interval_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_cpu_threshold_out_of_range_rejected() {
        for bad in [0.0, -5.0, 150.0] {
            let cfg = Config {
                cpu_threshold_percent: Some(bad),
                ..Config::default()
            };
            assert!(
                validate_effective_config(&cfg).is_err(),
                "cpu threshold {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_memory_threshold_out_of_range_rejected() {
        for bad in [0.0, 1.5] {
            let cfg = Config {
                memory_threshold_fraction: Some(bad),
                ..Config::default()
            };
            assert!(
                validate_effective_config(&cfg).is_err(),
                "memory threshold {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_boundary_thresholds_accepted() {
        let cfg = Config {
            cpu_threshold_percent: Some(100.0),
            memory_threshold_fraction: Some(1.0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let cfg = Config {
            enable_tls: Some(true),
            tls_cert_path: Some("/tmp/cert.pem".into()),
            tls_key_path: None,
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_yaml_aliases_accepted() {
        let yaml = "settle-interval-ms: 500\ncpu-threshold-percent: 70.0\n";
        let cfg: Config = serde_yaml::from_str(yaml).expect("yaml should parse");
        assert_eq!(cfg.settle_interval_ms, Some(500));
        assert_eq!(cfg.cpu_threshold_percent, Some(70.0));
    }
}
