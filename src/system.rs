//! Host-wide capacity constants read once at startup.
//!
//! This module provides the total memory capacity and logical processor
//! count used to normalize per-process usage figures. Both are captured
//! once when the daemon starts; they are not re-sampled per cycle.

use std::fs;

/// Divisor normalizing byte counts to megabytes.
pub const MB_DIVIDER: u64 = 1_048_576;

/// Number of online logical processors.
///
/// Used as the denominator when normalizing cumulative processor time into
/// a percentage of total processing capacity.
pub fn processor_count() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
        // Returns -1 on error - handled by the > 0 check
        unsafe {
            let n = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
            if n > 0 {
                return n as f64;
            }
        }
    }
    // Fallback for error cases or non-Unix platforms
    1.0
}

/// Reads total installed memory in bytes from /proc/meminfo.
pub fn total_memory_bytes() -> Result<u64, String> {
    let content = fs::read_to_string("/proc/meminfo")
        .map_err(|e| format!("Failed to read /proc/meminfo: {}", e))?;

    parse_mem_total(&content).ok_or_else(|| "No MemTotal line in /proc/meminfo".to_string())
}

/// Parses the MemTotal line of a meminfo document, returning bytes.
/// Format: "MemTotal:       16316412 kB"
pub fn parse_mem_total(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mem_total() {
        let content = "MemTotal:       16316412 kB\nMemFree:         8000000 kB\n";
        assert_eq!(parse_mem_total(content), Some(16316412 * 1024));
    }

    #[test]
    fn test_parse_mem_total_missing() {
        let content = "MemFree:         8000000 kB\n";
        assert_eq!(parse_mem_total(content), None);
    }

    #[test]
    fn test_parse_mem_total_malformed_value() {
        let content = "MemTotal:       lots kB\n";
        assert_eq!(parse_mem_total(content), None);
    }

    #[test]
    fn test_processor_count_positive() {
        assert!(processor_count() >= 1.0);
    }
}
