//! Process enumeration and per-process sampling.
//!
//! One snapshot is a full read of the process table: for every numeric
//! entry under the proc root, the sampler reads the display name, resident
//! memory, and cumulative processor time. Individual processes routinely
//! vanish between enumeration and the detail reads; those outcomes are
//! reported per process so the reconciliation loop can skip them without
//! aborting the cycle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::process::cpu::parse_cpu_time_ms;
use crate::process::memory::read_resident_bytes;

/// One process observation: identifier, display name, resident memory,
/// and cumulative processor time since the process started.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub memory_bytes: u64,
    pub cpu_time_ms: f64,
}

/// Why a single process could not be sampled this cycle.
///
/// `Vanished` and `Denied` are expected churn (the process exited between
/// enumeration and the detail read, or belongs to another user); anything
/// else is surfaced at a higher log level by the caller.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("process exited during sampling")]
    Vanished,
    #[error("access denied")]
    Denied,
    #[error("unreadable process entry: {0}")]
    Unreadable(String),
}

impl SampleError {
    /// Expected churn, skipped with a debug trace only.
    pub fn is_transient(&self) -> bool {
        matches!(self, SampleError::Vanished | SampleError::Denied)
    }

    fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => SampleError::Vanished,
            io::ErrorKind::PermissionDenied => SampleError::Denied,
            _ => SampleError::Unreadable(e.to_string()),
        }
    }
}

/// Enumeration of the process table itself failed. Unlike per-process
/// errors this aborts the cycle and is handled by the loop supervisor.
#[derive(Debug, Error)]
#[error("failed to enumerate processes under {root}: {source}")]
pub struct SnapshotError {
    pub root: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Scans the proc root and samples every process found there.
///
/// Returns one outcome per numeric entry; only the directory listing
/// itself failing is fatal.
pub fn collect_samples(
    root: &Path,
) -> Result<Vec<(u32, Result<ProcessSample, SampleError>)>, SnapshotError> {
    let entries = fs::read_dir(root).map_err(|e| SnapshotError {
        root: root.to_path_buf(),
        source: e,
    })?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push((pid, sample_process(pid, &p)));
    }
    Ok(out)
}

/// Reads one process's name, memory, and cumulative CPU time.
pub fn sample_process(pid: u32, proc_path: &Path) -> Result<ProcessSample, SampleError> {
    let name = read_process_name(proc_path).ok_or(SampleError::Vanished)?;

    let cpu_time_ms = parse_cpu_time_ms(proc_path).map_err(SampleError::from_io)?;
    let memory_bytes = read_resident_bytes(proc_path).map_err(SampleError::from_io)?;

    Ok(ProcessSample {
        pid,
        name,
        memory_bytes,
        cpu_time_ms,
    })
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = proc_path.join("comm");
    if let Ok(s) = fs::read_to_string(&comm) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let cmd = proc_path.join("cmdline");
    if let Ok(content) = fs::read(&cmd) {
        if !content.is_empty() {
            let parts: Vec<&str> = content
                .split(|&b| b == 0u8)
                .filter_map(|s| std::str::from_utf8(s).ok())
                .collect();
            if !parts.is_empty() {
                if let Some(name) = Path::new(parts[0]).file_name() {
                    return name.to_str().map(|s| s.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_proc_entry(root: &Path, pid: u32, name: &str, rss_kb: u64, ticks: u64) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), format!("{}\n", name)).unwrap();
        fs::write(
            dir.join("status"),
            format!("Name:\t{}\nVmRSS:\t{} kB\n", name, rss_kb),
        )
        .unwrap();
        // utime carries all the ticks, stime zero
        fs::write(
            dir.join("stat"),
            format!(
                "{} ({}) S 1 1 1 0 -1 4194304 0 0 0 0 {} 0 0 0 20 0 1 0 100 1000 100 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0",
                pid, name, ticks
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_collect_samples_numeric_entries_only() {
        let root = tempdir().unwrap();
        write_proc_entry(root.path(), 101, "alpha", 1024, 100);
        write_proc_entry(root.path(), 202, "beta", 2048, 200);
        fs::create_dir(root.path().join("sys")).unwrap();
        fs::write(root.path().join("uptime"), "100.0 200.0").unwrap();

        let outcomes = collect_samples(root.path()).expect("enumeration should succeed");
        let mut pids: Vec<u32> = outcomes.iter().map(|(pid, _)| *pid).collect();
        pids.sort_unstable();
        assert_eq!(pids, vec![101, 202]);
        assert!(outcomes.iter().all(|(_, r)| r.is_ok()));
    }

    #[test]
    fn test_collect_samples_missing_root() {
        let root = tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(collect_samples(&missing).is_err());
    }

    #[test]
    fn test_sample_process_values() {
        let root = tempdir().unwrap();
        write_proc_entry(root.path(), 303, "gamma", 4096, 500);

        let sample =
            sample_process(303, &root.path().join("303")).expect("sample should succeed");
        assert_eq!(sample.pid, 303);
        assert_eq!(sample.name, "gamma");
        assert_eq!(sample.memory_bytes, 4096 * 1024);
        let expected_ms = 500.0 / *crate::process::cpu::CLK_TCK * 1000.0;
        assert!((sample.cpu_time_ms - expected_ms).abs() < 0.001);
    }

    #[test]
    fn test_sample_process_vanished() {
        let root = tempdir().unwrap();
        // Directory exists but no files - like a process that exited
        // between enumeration and the detail reads
        let dir = root.path().join("404");
        fs::create_dir(&dir).unwrap();

        let err = sample_process(404, &dir).expect_err("should fail");
        assert!(err.is_transient());
    }

    #[test]
    fn test_read_process_name_cmdline_fallback() {
        let root = tempdir().unwrap();
        let dir = root.path().join("505");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cmdline"), b"/usr/bin/delta\0--flag\0").unwrap();

        assert_eq!(read_process_name(&dir), Some("delta".to_string()));
    }

    #[test]
    fn test_unreadable_is_not_transient() {
        let err = SampleError::Unreadable("bad stat".into());
        assert!(!err.is_transient());
    }
}
