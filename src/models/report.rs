// Data Usage - Usage Report Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Per-call usage report model.

use serde::Serialize;

/// Byte totals for one usage query, split by transport.
///
/// Both values count device-wide traffic since the counters were last reset
/// (reboot), not since this process started. The non-mobile total is not
/// measured independently but derived as total minus mobile, so it inherits
/// any skew between the two counter families; a negative value is preserved
/// rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    /// Bytes carried over the cellular (WWAN) interface class.
    #[serde(rename = "mobile")]
    pub mobile_bytes: i64,
    /// Bytes carried over everything else. Named `wifi` on the wire.
    #[serde(rename = "wifi")]
    pub other_bytes: i64,
}

impl UsageReport {
    /// True when the total counter family lagged the mobile family and the
    /// derived non-mobile value came out negative.
    pub fn has_negative_skew(&self) -> bool {
        self.other_bytes < 0
    }
}
