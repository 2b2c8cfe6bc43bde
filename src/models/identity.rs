// Data Usage - Caller Identity Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Identity of the calling process, as presented to the authorization
//! service.

use std::fs;

use anyhow::{anyhow, Context, Result};

/// The process asking for usage statistics.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Process id.
    pub pid: u32,
    /// Process start time in clock ticks since boot. Polkit requires it to
    /// tell apart processes that reused a pid.
    pub start_time: u64,
    /// Real user id.
    pub uid: u32,
    /// Application identifier presented to the authorization service.
    pub app_id: String,
}

impl CallerIdentity {
    /// Build the identity of the current process from procfs.
    pub fn current(app_id: &str) -> Result<Self> {
        let status = fs::read_to_string("/proc/self/status")
            .context("Failed to read /proc/self/status")?;
        let uid = parse_uid(&status)
            .ok_or_else(|| anyhow!("No Uid line in /proc/self/status"))?;

        let stat = fs::read_to_string("/proc/self/stat")
            .context("Failed to read /proc/self/stat")?;
        let start_time = parse_start_time(&stat)
            .ok_or_else(|| anyhow!("Malformed /proc/self/stat"))?;

        Ok(Self {
            pid: std::process::id(),
            start_time,
            uid,
            app_id: app_id.to_string(),
        })
    }
}

/// Parse the real uid from a `/proc/{pid}/status` dump.
fn parse_uid(status: &str) -> Option<u32> {
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("Uid:") {
            return rest.split_whitespace().next()?.parse().ok();
        }
    }
    None
}

/// Parse the start time (field 22) from `/proc/{pid}/stat`.
///
/// The comm field may itself contain spaces and parentheses, so fields are
/// counted from the last closing paren.
fn parse_start_time(stat: &str) -> Option<u64> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    // Field 3 (state) is the first token after the comm; field 22 is the
    // 20th.
    after_comm.split_whitespace().nth(19)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uid() {
        let status = "Name:\tdata-usage\nUmask:\t0022\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n";
        assert_eq!(parse_uid(status), Some(1000));
        assert_eq!(parse_uid("Name:\tdata-usage\n"), None);
    }

    #[test]
    fn test_parse_start_time() {
        // Comm with spaces and parens must not shift the field count.
        let stat = "1234 (my (weird) comm) S 1 1234 1234 0 -1 4194304 123 0 0 0 \
                    10 5 0 0 20 0 1 0 987654 12345678 100 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";
        assert_eq!(parse_start_time(stat), Some(987654));
        assert_eq!(parse_start_time("1234 (short)"), None);
    }
}
