//! Resident-set parsing for process sampling.
//!
//! Reads a process's resident memory from the VmRSS line of
//! `/proc/<pid>/status`. Kernel threads carry no VmRSS entry; they report
//! zero resident bytes.

use std::fs;
use std::path::Path;

/// Reads resident memory in bytes from /proc/<pid>/status.
pub fn read_resident_bytes(proc_path: &Path) -> Result<u64, std::io::Error> {
    let status_path = proc_path.join("status");
    let content = fs::read_to_string(status_path)?;

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("VmRSS:") {
            let kb = parse_kb_value(value)
                .ok_or_else(|| std::io::Error::other("Malformed VmRSS line"))?;
            return Ok(kb * 1024);
        }
    }

    // Kernel threads have no memory mapping and no VmRSS line
    Ok(0)
}

/// Parses kilobyte values from status file lines ("    1234 kB").
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}
