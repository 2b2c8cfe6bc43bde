// Data Usage - Pkcheck Authority
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Legacy authorization probing via the `pkcheck(1)` CLI.
//!
//! Some older or minimal hosts run a polkit daemon that is not reachable for
//! unprivileged D-Bus queries; the setuid helper still answers there.

use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

use super::{AuthoritySource, AuthorizationMode};
use crate::models::CallerIdentity;

const PKCHECK_PATHS: &[&str] = &["/usr/bin/pkcheck", "/usr/local/bin/pkcheck", "/bin/pkcheck"];

/// Authorization source shelling out to `pkcheck`.
pub struct PkcheckAuthority {
    action_id: String,
}

impl PkcheckAuthority {
    pub fn new(action_id: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
        }
    }

    /// Whether the pkcheck binary is present on this host.
    pub fn available() -> bool {
        PKCHECK_PATHS.iter().any(|p| Path::new(p).exists())
    }
}

impl AuthoritySource for PkcheckAuthority {
    fn query_mode(&self, who: &CallerIdentity) -> Result<AuthorizationMode> {
        let process = format!("{},{}", who.pid, who.start_time);
        let output = Command::new("pkcheck")
            .args(["--action-id", &self.action_id, "--process", &process])
            .output()
            .context("Failed to execute pkcheck")?;

        // Exit 0 means authorized, 1 means not; anything else is a runtime
        // or usage error and must not read as a verdict.
        match output.status.code() {
            Some(0) => Ok(AuthorizationMode::Allowed),
            Some(1) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("authentication") {
                    Ok(AuthorizationMode::Challenge)
                } else {
                    Ok(AuthorizationMode::Denied)
                }
            }
            code => Err(anyhow!(
                "pkcheck exited with {:?}: {}",
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        }
    }

    fn name(&self) -> &'static str {
        "pkcheck"
    }
}
