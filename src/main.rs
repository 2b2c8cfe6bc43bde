// Data Usage - Main Entry Point
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! data-usage - report device data consumption, split into mobile and
//! Wi-Fi/other byte totals, and whether this process may query usage
//! statistics at all.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;

mod channel;
mod config;
mod models;
mod permission;
mod usage;

use channel::{MethodDispatcher, MethodResponse};
use config::Settings;
use models::CallerIdentity;
use permission::PermissionChecker;
use usage::{CounterSource, SysfsCounters, UsageAggregator};

/// Application ID presented to the authorization service.
const APP_ID: &str = "com.chrisdaggas.data-usage";

#[derive(Parser)]
#[command(
    name = "data-usage",
    version,
    about = "Report device data consumption, split into mobile and Wi-Fi"
)]
struct Cli {
    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether this process may query usage statistics.
    Permission,
    /// Print the current mobile / Wi-Fi byte totals.
    Usage,
    /// Dispatch a raw channel method and print the reply envelope.
    Call {
        /// Method name, e.g. "getDataUsage".
        method: String,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::load();

    let identity = match CallerIdentity::current(APP_ID) {
        Ok(identity) => identity,
        Err(err) => {
            eprintln!("data-usage: cannot determine caller identity: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let authority = permission::detect_authority(&settings.polkit_action_id);
    let checker = PermissionChecker::new(authority, identity);

    let counters = match &settings.sysfs_root {
        Some(root) => SysfsCounters::with_roots(
            root,
            "/proc/net/dev",
            settings.mobile_interface_prefixes.clone(),
        ),
        None => SysfsCounters::new(settings.mobile_interface_prefixes.clone()),
    };
    let dispatcher = MethodDispatcher::new(checker, UsageAggregator::new(counters));

    match cli.command {
        Some(Command::Permission) => run_permission(&dispatcher, cli.json),
        Some(Command::Usage) => run_usage(&dispatcher, cli.json),
        Some(Command::Call { method }) => run_call(&dispatcher, &method),
        None => run_report(&dispatcher, cli.json),
    }
}

fn run_permission<S: CounterSource>(dispatcher: &MethodDispatcher<S>, json: bool) -> ExitCode {
    let granted = dispatcher.checker().has_usage_permission();
    if json {
        println!("{}", json!({ "granted": granted }));
    } else if granted {
        println!("Usage statistics access: granted");
    } else {
        println!("Usage statistics access: not granted");
    }
    ExitCode::SUCCESS
}

fn run_usage<S: CounterSource>(dispatcher: &MethodDispatcher<S>, json: bool) -> ExitCode {
    match dispatcher.aggregator().data_usage() {
        Ok(report) => {
            if json {
                println!("{}", json!(report));
            } else {
                println!(
                    "Mobile:      {} ({} bytes)",
                    format_bytes(report.mobile_bytes),
                    report.mobile_bytes
                );
                println!(
                    "Wi-Fi/other: {} ({} bytes)",
                    format_bytes(report.other_bytes),
                    report.other_bytes
                );
                if report.has_negative_skew() {
                    println!("Note: counter families disagree; the non-mobile total is negative");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("data-usage: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_call<S: CounterSource>(dispatcher: &MethodDispatcher<S>, method: &str) -> ExitCode {
    tracing::debug!("Dispatching {} on {}", method, channel::CHANNEL);
    let response = dispatcher.handle(method);
    println!("{}", response.to_json());
    match response {
        MethodResponse::Success(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn run_report<S: CounterSource>(dispatcher: &MethodDispatcher<S>, json: bool) -> ExitCode {
    let granted = dispatcher.checker().has_usage_permission();
    let usage = dispatcher.aggregator().data_usage();

    if json {
        let mut report = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "permission": granted,
        });
        match &usage {
            Ok(r) => report["usage"] = json!(r),
            Err(e) => {
                report["error"] =
                    json!({ "code": e.code, "message": e.message, "details": e.detail })
            }
        }
        println!("{}", report);
    } else {
        println!(
            "Usage statistics access: {}",
            if granted { "granted" } else { "not granted" }
        );
        match &usage {
            Ok(r) => {
                println!("Mobile:      {}", format_bytes(r.mobile_bytes));
                println!("Wi-Fi/other: {}", format_bytes(r.other_bytes));
            }
            Err(e) => println!("Data usage:  unavailable ({})", e.detail),
        }
    }

    if usage.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Render a byte count with a binary-unit suffix for human output.
fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let sign = if bytes < 0 { "-" } else { "" };
    let mut value = bytes.unsigned_abs() as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{} {}", sign, value as u64, UNITS[unit])
    } else {
        format!("{}{:.1} {}", sign, value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1_500_000), "1.4 MiB");
        assert_eq!(format_bytes(-1536), "-1.5 KiB");
    }
}
