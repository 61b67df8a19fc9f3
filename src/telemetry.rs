//! Process and file telemetry snapshots.
//!
//! Everything here is read-only and best effort: a query that fails, or a
//! platform that cannot answer it, yields `None`/empty rather than an error,
//! and the corresponding report line is silently skipped. Memory counters
//! come from `sysinfo`; peak counters, loaded modules, and security
//! attributes are parsed from `/proc` on Linux.

use std::path::Path;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Point-in-time memory counters for the current process.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCounters {
    /// Resident set size (working set) in bytes.
    pub resident_bytes: u64,
    /// Virtual address-space size in bytes.
    pub virtual_bytes: u64,
    /// Peak resident set size in bytes, where the platform exposes it.
    pub peak_resident_bytes: Option<u64>,
    /// Peak virtual size in bytes, where the platform exposes it.
    pub peak_virtual_bytes: Option<u64>,
}

/// Snapshot the current process's memory counters.
pub fn memory_counters() -> Option<MemoryCounters> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    let process = sys.process(pid)?;
    let (peak_resident_bytes, peak_virtual_bytes) = peak_counters();
    Some(MemoryCounters {
        resident_bytes: process.memory(),
        virtual_bytes: process.virtual_memory(),
        peak_resident_bytes,
        peak_virtual_bytes,
    })
}

#[cfg(target_os = "linux")]
fn peak_counters() -> (Option<u64>, Option<u64>) {
    let status = std::fs::read_to_string("/proc/self/status").unwrap_or_default();
    (
        parse_status_kib(&status, "VmHWM"),
        parse_status_kib(&status, "VmPeak"),
    )
}

#[cfg(not(target_os = "linux"))]
fn peak_counters() -> (Option<u64>, Option<u64>) {
    (None, None)
}

/// `VmHWM:    12345 kB` style field, returned in bytes.
fn parse_status_kib(status: &str, field: &str) -> Option<u64> {
    for line in status.lines() {
        let Some(rest) = line.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let value = rest.split_whitespace().next()?;
        return value.parse::<u64>().ok().map(|kib| kib * 1024);
    }
    None
}

/// One file-backed mapping group in the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Filesystem path of the mapped object.
    pub path: String,
    /// Lowest mapped address.
    pub base_address: u64,
    /// Total bytes mapped from this object.
    pub mapped_bytes: u64,
}

/// Enumerate file-backed mappings of the current process.
///
/// Empty on platforms without `/proc`, or when the maps file is unreadable.
pub fn loaded_modules() -> Vec<LoadedModule> {
    #[cfg(target_os = "linux")]
    {
        let Ok(text) = std::fs::read_to_string("/proc/self/maps") else {
            return Vec::new();
        };
        parse_maps(&text)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

fn parse_maps(text: &str) -> Vec<LoadedModule> {
    use std::collections::HashMap;

    let mut grouped: HashMap<String, (u64, u64)> = HashMap::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let Some(range) = fields.next() else {
            continue;
        };
        let Some((start_s, end_s)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            u64::from_str_radix(start_s, 16),
            u64::from_str_radix(end_s, 16),
        ) else {
            continue;
        };
        // perms, offset, dev, inode
        let Some(path) = fields.nth(4) else {
            continue;
        };
        if !path.starts_with('/') {
            continue;
        }
        let entry = grouped.entry(path.to_string()).or_insert((start, 0));
        entry.0 = entry.0.min(start);
        entry.1 = entry.1.saturating_add(end.saturating_sub(start));
    }

    let mut modules: Vec<LoadedModule> = grouped
        .into_iter()
        .map(|(path, (base_address, mapped_bytes))| LoadedModule {
            path,
            base_address,
            mapped_bytes,
        })
        .collect();
    modules.sort_by_key(|m| m.base_address);
    modules
}

/// Security attributes of the current process.
///
/// The Linux rendition of a mandatory integrity label: effective ids plus the
/// attributes that bound what the process may escalate to.
#[derive(Debug, Clone, Copy)]
pub struct SecurityAttributes {
    pub effective_uid: u32,
    pub effective_gid: u32,
    /// `NoNewPrivs` flag, when exposed.
    pub no_new_privs: Option<bool>,
    /// Seccomp mode (0 disabled, 1 strict, 2 filter), when exposed.
    pub seccomp_mode: Option<u32>,
    /// Effective capability mask, when exposed.
    pub effective_caps: Option<u64>,
}

impl SecurityAttributes {
    /// Collapse the attributes to a coarse trust tier.
    pub fn trust_tier(&self) -> &'static str {
        if self.effective_uid == 0 {
            "system"
        } else if self.effective_caps.is_some_and(|caps| caps != 0) {
            "high"
        } else if self.no_new_privs == Some(true) {
            "low"
        } else {
            "medium"
        }
    }
}

/// Snapshot the current process's security attributes.
pub fn process_security() -> Option<SecurityAttributes> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_security(&status)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn parse_security(status: &str) -> Option<SecurityAttributes> {
    let effective_uid = parse_id_field(status, "Uid:")?;
    let effective_gid = parse_id_field(status, "Gid:")?;
    let no_new_privs = parse_status_u64(status, "NoNewPrivs").map(|v| v != 0);
    let seccomp_mode = parse_status_u64(status, "Seccomp").map(|v| v as u32);
    let effective_caps = parse_status_hex(status, "CapEff");
    Some(SecurityAttributes {
        effective_uid,
        effective_gid,
        no_new_privs,
        seccomp_mode,
        effective_caps,
    })
}

/// Second column of `Uid:`/`Gid:` lines (the effective id).
fn parse_id_field(status: &str, prefix: &str) -> Option<u32> {
    for line in status.lines() {
        let Some(rest) = line.strip_prefix(prefix) else {
            continue;
        };
        let mut it = rest.split_whitespace();
        let _real = it.next()?;
        return it.next()?.parse::<u32>().ok();
    }
    None
}

fn parse_status_u64(status: &str, field: &str) -> Option<u64> {
    for line in status.lines() {
        let Some(rest) = line.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        return rest.split_whitespace().next()?.parse::<u64>().ok();
    }
    None
}

fn parse_status_hex(status: &str, field: &str) -> Option<u64> {
    for line in status.lines() {
        let Some(rest) = line.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        return u64::from_str_radix(rest.split_whitespace().next()?, 16).ok();
    }
    None
}

/// Ownership and permissions of the probed file.
#[derive(Debug, Clone)]
pub struct FileOwnership {
    pub uid: u32,
    pub gid: u32,
    /// Permission bits (lower 12 bits of the mode).
    pub mode: u32,
    /// Owner account name, when it can be resolved.
    pub owner: Option<String>,
}

/// Look up ownership of a file, best effort.
pub fn file_ownership(path: &Path) -> Option<FileOwnership> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::metadata(path).ok()?;
        let uid = meta.uid();
        let users = sysinfo::Users::new_with_refreshed_list();
        let owner = users
            .iter()
            .find(|u| **u.id() == uid)
            .map(|u| u.name().to_string());
        Some(FileOwnership {
            uid,
            gid: meta.gid(),
            mode: meta.mode() & 0o7777,
            owner,
        })
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}
