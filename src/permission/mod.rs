// Data Usage - Permission Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Usage-statistics authorization checking.
//!
//! The host's authorization service sits behind [`AuthoritySource`], with one
//! implementation per host flavour and the pick made once at startup by
//! [`detect_authority`]. [`PermissionChecker`] collapses the multi-valued
//! host answer to a fail-closed boolean: only an explicit allow reads as
//! granted, and any failure to reach the service reads as denied.

mod pkcheck;
mod polkit;

pub use pkcheck::PkcheckAuthority;
pub use polkit::PolkitAuthority;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::models::CallerIdentity;

/// Polkit action id gating usage-statistics queries.
pub const DEFAULT_ACTION_ID: &str = "com.chrisdaggas.data-usage.query-usage-stats";

/// Authorization mode reported by the host for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationMode {
    /// Explicitly allowed.
    Allowed,
    /// Allowed only after interactive authentication.
    Challenge,
    /// Denied, never asked, or otherwise not allowed.
    Denied,
}

/// A host authorization service that can answer usage-stats queries.
pub trait AuthoritySource {
    /// Ask the host how the capability is set for the given caller.
    fn query_mode(&self, who: &CallerIdentity) -> Result<AuthorizationMode>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Terminal fallback when no authorization service is reachable.
pub struct DenyAllAuthority;

impl AuthoritySource for DenyAllAuthority {
    fn query_mode(&self, _who: &CallerIdentity) -> Result<AuthorizationMode> {
        Ok(AuthorizationMode::Denied)
    }

    fn name(&self) -> &'static str {
        "deny-all"
    }
}

/// Pick the authorization source for this host.
///
/// Tried in order: polkit over the system D-Bus, the legacy `pkcheck`
/// binary, then a deny-all fallback. The choice is made once here so no
/// host-version branches leak into the checker.
pub fn detect_authority(action_id: &str) -> Box<dyn AuthoritySource> {
    match PolkitAuthority::connect(action_id) {
        Ok(authority) => {
            info!("Using polkit D-Bus authority");
            return Box::new(authority);
        }
        Err(err) => debug!("Polkit D-Bus authority unavailable: {:#}", err),
    }

    if PkcheckAuthority::available() {
        info!("Using legacy pkcheck authority");
        return Box::new(PkcheckAuthority::new(action_id));
    }

    warn!("No authorization service found; usage permission will read as denied");
    Box::new(DenyAllAuthority)
}

/// Answers whether the calling process may query usage statistics.
pub struct PermissionChecker {
    authority: Box<dyn AuthoritySource>,
    identity: CallerIdentity,
}

impl PermissionChecker {
    pub fn new(authority: Box<dyn AuthoritySource>, identity: CallerIdentity) -> Self {
        Self {
            authority,
            identity,
        }
    }

    /// True iff the host reports the capability as explicitly allowed.
    ///
    /// Denied, unset, and challenge modes all read as false, as does any
    /// failure to reach the authorization service. Callers that need to tell
    /// "denied" from "never asked" need a separate flow; this check never
    /// errors.
    pub fn has_usage_permission(&self) -> bool {
        match self.authority.query_mode(&self.identity) {
            Ok(mode) => mode == AuthorizationMode::Allowed,
            Err(err) => {
                warn!(
                    "{} authority query failed: {:#}",
                    self.authority.name(),
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn identity() -> CallerIdentity {
        CallerIdentity {
            pid: 4321,
            start_time: 1,
            uid: 1000,
            app_id: "com.chrisdaggas.data-usage".to_string(),
        }
    }

    struct FixedAuthority(AuthorizationMode);

    impl AuthoritySource for FixedAuthority {
        fn query_mode(&self, _who: &CallerIdentity) -> Result<AuthorizationMode> {
            Ok(self.0)
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct BrokenAuthority;

    impl AuthoritySource for BrokenAuthority {
        fn query_mode(&self, _who: &CallerIdentity) -> Result<AuthorizationMode> {
            Err(anyhow!("service did not answer"))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_only_allowed_reads_as_granted() {
        let allowed =
            PermissionChecker::new(Box::new(FixedAuthority(AuthorizationMode::Allowed)), identity());
        assert!(allowed.has_usage_permission());

        let challenge = PermissionChecker::new(
            Box::new(FixedAuthority(AuthorizationMode::Challenge)),
            identity(),
        );
        assert!(!challenge.has_usage_permission());

        let denied =
            PermissionChecker::new(Box::new(FixedAuthority(AuthorizationMode::Denied)), identity());
        assert!(!denied.has_usage_permission());
    }

    #[test]
    fn test_query_failure_is_fail_closed() {
        let checker = PermissionChecker::new(Box::new(BrokenAuthority), identity());
        assert!(!checker.has_usage_permission());
    }

    #[test]
    fn test_deny_all_fallback() {
        let checker = PermissionChecker::new(Box::new(DenyAllAuthority), identity());
        assert!(!checker.has_usage_permission());
    }
}
