//! Cumulative processor-time parsing for process sampling.
//!
//! This module reads the total CPU time a process has consumed since it
//! started from `/proc/<pid>/stat`. The value is monotonically
//! non-decreasing; the registry turns successive readings into a usage
//! percentage.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Parse cumulative CPU time (user+system) in milliseconds from /proc/<pid>/stat.
pub fn parse_cpu_time_ms(proc_path: &Path) -> Result<f64, std::io::Error> {
    let stat_path = proc_path.join("stat");
    let content = fs::read_to_string(stat_path)?;

    // The comm field (2) may contain spaces; everything after the closing
    // paren is whitespace-separated. utime and stime are fields 14 and 15
    // of the full line, i.e. fields 12 and 13 after the paren.
    let after_comm = content
        .rsplit_once(')')
        .map(|(_, rest)| rest)
        .unwrap_or(content.as_str());
    let parts: Vec<&str> = after_comm.split_whitespace().collect();
    if parts.len() <= 12 {
        return Err(std::io::Error::other("Invalid stat format"));
    }

    let utime: f64 = parts[11].parse().unwrap_or(0.0);
    let stime: f64 = parts[12].parse().unwrap_or(0.0);

    // Ticks to milliseconds using the system-detected clock rate
    Ok((utime + stime) / *CLK_TCK * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_cpu_time_ms() {
        // Create a temporary directory to simulate /proc/<pid>/stat
        let dir = tempdir().expect("Failed to create temp dir");
        let stat_path = dir.path().join("stat");

        // Typical /proc/<pid>/stat format:
        // pid (comm) state ppid pgrp session tty_nr tpgid flags minflt cminflt majflt cmajflt utime stime ...
        // Fields 14 and 15 are utime and stime in clock ticks

        // Example: utime=1000, stime=500 -> total = 1500 ticks
        let stat_content = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";
        std::fs::write(&stat_path, stat_content).expect("Failed to write stat file");

        let result = parse_cpu_time_ms(dir.path());
        assert!(result.is_ok());

        // Expected: (1000 + 500) / CLK_TCK seconds, in ms
        let expected = 1500.0 / *CLK_TCK * 1000.0;
        let actual = result.unwrap();
        assert!(
            (actual - expected).abs() < 0.001,
            "Expected ~{:.3}, got {:.3}",
            expected,
            actual
        );
    }

    #[test]
    fn test_parse_cpu_time_ms_name_with_spaces() {
        let dir = tempdir().expect("Failed to create temp dir");
        let stat_path = dir.path().join("stat");

        // comm fields like "(Web Content)" contain spaces and must not
        // shift the utime/stime offsets
        let stat_content = "4321 (Web Content) S 1 4321 4321 0 -1 4194304 100 0 0 0 200 100 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";
        std::fs::write(&stat_path, stat_content).expect("Failed to write stat file");

        let expected = 300.0 / *CLK_TCK * 1000.0;
        let actual = parse_cpu_time_ms(dir.path()).expect("should parse");
        assert!((actual - expected).abs() < 0.001);
    }

    #[test]
    fn test_parse_cpu_time_ms_invalid_stat() {
        let dir = tempdir().expect("Failed to create temp dir");
        let stat_path = dir.path().join("stat");

        // Invalid stat file with not enough fields
        std::fs::write(&stat_path, "1234 (test) S 1 2 3").expect("Failed to write stat file");

        let result = parse_cpu_time_ms(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_cpu_time_ms_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");

        // No stat file exists
        let result = parse_cpu_time_ms(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_cpu_time_ms_zero_values() {
        let dir = tempdir().expect("Failed to create temp dir");
        let stat_path = dir.path().join("stat");

        // utime=0, stime=0
        let stat_content = "1234 (idle_process) S 1 1234 1234 0 -1 4194304 0 0 0 0 0 0 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";
        std::fs::write(&stat_path, stat_content).expect("Failed to write stat file");

        let result = parse_cpu_time_ms(dir.path());
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 0.0);
    }
}
