// Data Usage - Counter Sources
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Raw cumulative byte counters from the kernel.
//!
//! # Data Sources
//!
//! - `/sys/class/net/{iface}/statistics/rx_bytes` and `tx_bytes` - per
//!   interface, primary
//! - `/proc/net/dev` - fallback when the sysfs tree cannot be enumerated
//!
//! Counters are device-wide, count since the last reboot, and only ever grow
//! between reboots. "Mobile" is any interface whose name matches one of the
//! configured WWAN prefixes; "total" is every interface except loopback.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Sentinel a source reports for a counter the device does not track.
pub const UNSUPPORTED: i64 = -1;

/// Default interface-name prefixes classified as mobile (cellular/WWAN).
pub const DEFAULT_MOBILE_PREFIXES: &[&str] = &["wwan", "ppp", "rmnet", "ccmni"];

/// Access to the four raw cumulative byte counters.
///
/// The aggregation arithmetic only ever sees this trait, so it can be tested
/// against an injected fake without touching host state. A source may report
/// [`UNSUPPORTED`] for a counter family it cannot track; it must never
/// substitute zero for one.
pub trait CounterSource {
    /// Bytes received on the mobile interface class since reset.
    fn mobile_rx_bytes(&self) -> Result<i64>;
    /// Bytes transmitted on the mobile interface class since reset.
    fn mobile_tx_bytes(&self) -> Result<i64>;
    /// Bytes received on all interfaces since reset.
    fn total_rx_bytes(&self) -> Result<i64>;
    /// Bytes transmitted on all interfaces since reset.
    fn total_tx_bytes(&self) -> Result<i64>;
}

/// Which direction of a statistics pair to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Rx,
    Tx,
}

impl Direction {
    fn file_name(self) -> &'static str {
        match self {
            Self::Rx => "rx_bytes",
            Self::Tx => "tx_bytes",
        }
    }
}

/// Which interface family a counter covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Mobile,
    Total,
}

/// Counter source backed by the kernel's sysfs statistics tree.
pub struct SysfsCounters {
    root: PathBuf,
    proc_net_dev: PathBuf,
    mobile_prefixes: Vec<String>,
}

impl SysfsCounters {
    /// Create a source reading the standard kernel paths.
    pub fn new(mobile_prefixes: Vec<String>) -> Self {
        Self::with_roots("/sys/class/net", "/proc/net/dev", mobile_prefixes)
    }

    /// Create a source with overridden roots (tests, unusual mounts).
    pub fn with_roots(
        root: impl Into<PathBuf>,
        proc_net_dev: impl Into<PathBuf>,
        mobile_prefixes: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            proc_net_dev: proc_net_dev.into(),
            mobile_prefixes,
        }
    }

    fn family_includes(&self, family: Family, name: &str) -> bool {
        match family {
            Family::Mobile => self
                .mobile_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str())),
            // Loopback traffic never leaves the device.
            Family::Total => name != "lo",
        }
    }

    /// Sum one counter over one interface family.
    ///
    /// A missing or unparsable counter file for a present interface is an
    /// error; substituting zero would silently corrupt the derived totals
    /// downstream.
    fn sum_family(&self, family: Family, dir: Direction) -> Result<i64> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(
                    "Cannot enumerate {} ({}), falling back to {}",
                    self.root.display(),
                    err,
                    self.proc_net_dev.display()
                );
                return self.sum_proc_net_dev(family, dir);
            }
        };

        let mut sum: i64 = 0;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to enumerate {}", self.root.display()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.family_includes(family, &name) {
                continue;
            }
            // The class dir also holds plain files such as bonding_masters.
            if !entry.path().is_dir() {
                continue;
            }
            sum += read_counter_file(&entry.path().join("statistics").join(dir.file_name()))?;
        }

        Ok(sum)
    }

    /// Fallback: sum one counter over one family from `/proc/net/dev`.
    fn sum_proc_net_dev(&self, family: Family, dir: Direction) -> Result<i64> {
        let content = fs::read_to_string(&self.proc_net_dev)
            .with_context(|| format!("Failed to read {}", self.proc_net_dev.display()))?;

        let mut sum: i64 = 0;
        for (name, rx, tx) in parse_proc_net_dev(&content)? {
            if !self.family_includes(family, &name) {
                continue;
            }
            sum += match dir {
                Direction::Rx => rx,
                Direction::Tx => tx,
            };
        }

        Ok(sum)
    }
}

impl CounterSource for SysfsCounters {
    fn mobile_rx_bytes(&self) -> Result<i64> {
        self.sum_family(Family::Mobile, Direction::Rx)
    }

    fn mobile_tx_bytes(&self) -> Result<i64> {
        self.sum_family(Family::Mobile, Direction::Tx)
    }

    fn total_rx_bytes(&self) -> Result<i64> {
        self.sum_family(Family::Total, Direction::Rx)
    }

    fn total_tx_bytes(&self) -> Result<i64> {
        self.sum_family(Family::Total, Direction::Tx)
    }
}

/// Read a single sysfs counter file.
fn read_counter_file(path: &Path) -> Result<i64> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .trim()
        .parse()
        .with_context(|| format!("Malformed counter in {}", path.display()))
}

/// Parse `/proc/net/dev` into (interface, rx_bytes, tx_bytes) rows.
///
/// Format after the two header lines:
/// `iface: rx_bytes packets errs drop fifo frame compressed multicast tx_bytes ...`
fn parse_proc_net_dev(content: &str) -> Result<Vec<(String, i64, i64)>> {
    let mut rows = Vec::new();

    for line in content.lines().skip(2) {
        let (name, rest) = match line.split_once(':') {
            Some(parts) => parts,
            None => continue,
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 9 {
            anyhow::bail!("Malformed /proc/net/dev line: {}", line.trim());
        }

        let rx: i64 = fields[0]
            .parse()
            .with_context(|| format!("Bad rx_bytes for {}", name.trim()))?;
        let tx: i64 = fields[8]
            .parse()
            .with_context(|| format!("Bad tx_bytes for {}", name.trim()))?;

        rows.push((name.trim().to_string(), rx, tx));
    }

    Ok(rows)
}
