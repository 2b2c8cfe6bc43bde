// Data Usage - Usage Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Data usage aggregation over the raw host counters.

mod counters;

pub use counters::{CounterSource, SysfsCounters, DEFAULT_MOBILE_PREFIXES, UNSUPPORTED};

use thiserror::Error;
use tracing::warn;

use crate::models::UsageReport;

/// Machine-readable code carried by [`UnavailableError`].
pub const ERROR_CODE_UNAVAILABLE: &str = "UNAVAILABLE";

/// Raised when any required host counter cannot be obtained.
///
/// The only error kind this crate surfaces: a usage query either fully
/// succeeds with both totals or fails with this. The host-side diagnostic is
/// preserved in `detail` for debugging.
#[derive(Debug, Error)]
#[error("{message} [{code}]: {detail}")]
pub struct UnavailableError {
    /// Fixed machine-readable code.
    pub code: &'static str,
    /// Fixed human-readable message.
    pub message: &'static str,
    /// Diagnostic text from the underlying host failure.
    pub detail: String,
}

impl UnavailableError {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            code: ERROR_CODE_UNAVAILABLE,
            message: "Data usage not available.",
            detail: detail.into(),
        }
    }
}

/// Derives per-transport byte totals from the raw cumulative counters.
///
/// Stateless: every call reads a fresh snapshot, nothing is cached and
/// nothing is retried.
pub struct UsageAggregator<S: CounterSource> {
    source: S,
}

impl<S: CounterSource> UsageAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Read the four raw counters and derive the mobile / non-mobile split.
    ///
    /// The four reads are not atomic as a group; a small skew under live
    /// traffic is accepted. The non-mobile value may come out negative when
    /// the total counter family lags the mobile one - the raw value is
    /// returned unclamped so callers can see the anomaly.
    pub fn data_usage(&self) -> Result<UsageReport, UnavailableError> {
        let mobile_rx = checked("mobile rx", self.source.mobile_rx_bytes())?;
        let mobile_tx = checked("mobile tx", self.source.mobile_tx_bytes())?;
        let total_rx = checked("total rx", self.source.total_rx_bytes())?;
        let total_tx = checked("total tx", self.source.total_tx_bytes())?;

        let mobile_bytes = mobile_rx + mobile_tx;
        let total_bytes = total_rx + total_tx;
        let other_bytes = total_bytes - mobile_bytes;

        if other_bytes < 0 {
            warn!(
                "Counter families disagree: total {} < mobile {}",
                total_bytes, mobile_bytes
            );
        }

        Ok(UsageReport {
            mobile_bytes,
            other_bytes,
        })
    }
}

/// Map one raw counter read onto the availability contract.
///
/// Read failures and the unsupported sentinel are both hard failures. Zero
/// must never be substituted for either: it would silently corrupt the
/// derived non-mobile subtraction.
fn checked(which: &str, read: anyhow::Result<i64>) -> Result<i64, UnavailableError> {
    let value =
        read.map_err(|err| UnavailableError::new(format!("{} counter: {:#}", which, err)))?;
    if value == UNSUPPORTED {
        return Err(UnavailableError::new(format!(
            "{} counter is not tracked on this device",
            which
        )));
    }
    Ok(value)
}
