// Data Usage - Method Channel
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Named-method dispatch for the outer shell.
//!
//! Whatever hosts this crate (a UI, an RPC bridge) talks to it through two
//! named methods and a fixed reply envelope. Everything here is a thin
//! mapping onto the permission checker and the aggregator; no logic lives at
//! this layer.

use serde_json::{json, Value};

use crate::permission::PermissionChecker;
use crate::usage::{CounterSource, UsageAggregator};

/// Channel identifier the outer shell binds to.
pub const CHANNEL: &str = "com.chrisdaggas.data-usage/data_usage";

/// Method names accepted on the channel.
pub mod methods {
    pub const HAS_USAGE_PERMISSION: &str = "hasUsagePermission";
    pub const GET_DATA_USAGE: &str = "getDataUsage";
}

/// Reply envelope for one method call.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// Call succeeded; payload is method-specific.
    Success(Value),
    /// Call failed with a machine-readable code.
    Error {
        code: &'static str,
        message: String,
        details: String,
    },
    /// Unknown method name.
    NotImplemented,
}

impl MethodResponse {
    /// Wire form of the envelope.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success(result) => json!({ "status": "ok", "result": result }),
            Self::Error {
                code,
                message,
                details,
            } => json!({
                "status": "error",
                "code": code,
                "message": message,
                "details": details,
            }),
            Self::NotImplemented => json!({ "status": "notImplemented" }),
        }
    }
}

/// Dispatches channel method calls onto the two query operations.
pub struct MethodDispatcher<S: CounterSource> {
    checker: PermissionChecker,
    aggregator: UsageAggregator<S>,
}

impl<S: CounterSource> MethodDispatcher<S> {
    pub fn new(checker: PermissionChecker, aggregator: UsageAggregator<S>) -> Self {
        Self {
            checker,
            aggregator,
        }
    }

    pub fn checker(&self) -> &PermissionChecker {
        &self.checker
    }

    pub fn aggregator(&self) -> &UsageAggregator<S> {
        &self.aggregator
    }

    /// Handle one named method call.
    pub fn handle(&self, method: &str) -> MethodResponse {
        match method {
            methods::HAS_USAGE_PERMISSION => {
                MethodResponse::Success(json!(self.checker.has_usage_permission()))
            }
            methods::GET_DATA_USAGE => match self.aggregator.data_usage() {
                Ok(report) => MethodResponse::Success(json!(report)),
                Err(err) => MethodResponse::Error {
                    code: err.code,
                    message: err.message.to_string(),
                    details: err.detail,
                },
            },
            _ => MethodResponse::NotImplemented,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallerIdentity;
    use crate::permission::{AuthoritySource, AuthorizationMode};
    use crate::usage::UNSUPPORTED;
    use anyhow::Result;

    struct FixedAuthority(AuthorizationMode);

    impl AuthoritySource for FixedAuthority {
        fn query_mode(&self, _who: &CallerIdentity) -> Result<AuthorizationMode> {
            Ok(self.0)
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[derive(Clone, Copy)]
    struct FakeCounters {
        mobile_rx: i64,
        mobile_tx: i64,
        total_rx: i64,
        total_tx: i64,
    }

    impl CounterSource for FakeCounters {
        fn mobile_rx_bytes(&self) -> Result<i64> {
            Ok(self.mobile_rx)
        }
        fn mobile_tx_bytes(&self) -> Result<i64> {
            Ok(self.mobile_tx)
        }
        fn total_rx_bytes(&self) -> Result<i64> {
            Ok(self.total_rx)
        }
        fn total_tx_bytes(&self) -> Result<i64> {
            Ok(self.total_tx)
        }
    }

    fn dispatcher(mode: AuthorizationMode, counters: FakeCounters) -> MethodDispatcher<FakeCounters> {
        let identity = CallerIdentity {
            pid: 1,
            start_time: 1,
            uid: 1000,
            app_id: "test".to_string(),
        };
        MethodDispatcher::new(
            PermissionChecker::new(Box::new(FixedAuthority(mode)), identity),
            UsageAggregator::new(counters),
        )
    }

    const HEALTHY: FakeCounters = FakeCounters {
        mobile_rx: 1_000_000,
        mobile_tx: 500_000,
        total_rx: 3_000_000,
        total_tx: 1_500_000,
    };

    #[test]
    fn test_has_usage_permission_method() {
        let granted = dispatcher(AuthorizationMode::Allowed, HEALTHY);
        assert_eq!(
            granted.handle(methods::HAS_USAGE_PERMISSION),
            MethodResponse::Success(json!(true))
        );

        let denied = dispatcher(AuthorizationMode::Denied, HEALTHY);
        assert_eq!(
            denied.handle(methods::HAS_USAGE_PERMISSION),
            MethodResponse::Success(json!(false))
        );
    }

    #[test]
    fn test_get_data_usage_wire_record() {
        let dispatcher = dispatcher(AuthorizationMode::Allowed, HEALTHY);
        let response = dispatcher.handle(methods::GET_DATA_USAGE);
        // The wire record names the non-mobile field "wifi".
        assert_eq!(
            response,
            MethodResponse::Success(json!({ "wifi": 3_000_000, "mobile": 1_500_000 }))
        );
    }

    #[test]
    fn test_get_data_usage_unavailable_envelope() {
        let broken = FakeCounters {
            total_rx: UNSUPPORTED,
            ..HEALTHY
        };
        let dispatcher = dispatcher(AuthorizationMode::Allowed, broken);
        match dispatcher.handle(methods::GET_DATA_USAGE) {
            MethodResponse::Error {
                code,
                message,
                details,
            } => {
                assert_eq!(code, "UNAVAILABLE");
                assert_eq!(message, "Data usage not available.");
                assert!(details.contains("total rx"));
            }
            other => panic!("expected error envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_method() {
        let dispatcher = dispatcher(AuthorizationMode::Allowed, HEALTHY);
        assert_eq!(dispatcher.handle("resetCounters"), MethodResponse::NotImplemented);
        assert_eq!(
            dispatcher.handle("resetCounters").to_json(),
            json!({ "status": "notImplemented" })
        );
    }

    #[test]
    fn test_envelope_json_shapes() {
        let ok = MethodResponse::Success(json!(true)).to_json();
        assert_eq!(ok, json!({ "status": "ok", "result": true }));

        let err = MethodResponse::Error {
            code: "UNAVAILABLE",
            message: "Data usage not available.".to_string(),
            details: "boom".to_string(),
        }
        .to_json();
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "UNAVAILABLE");
        assert_eq!(err["details"], "boom");
    }
}
