// Data Usage - Polkit Authority
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Polkit D-Bus authority implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use zbus::blocking::Connection;
use zbus::zvariant::Value;

use super::{AuthoritySource, AuthorizationMode};
use crate::models::CallerIdentity;

/// D-Bus bus name for polkit.
pub const BUS_NAME: &str = "org.freedesktop.PolicyKit1";

/// D-Bus object paths.
pub mod paths {
    pub const AUTHORITY: &str = "/org/freedesktop/PolicyKit1/Authority";
    pub const DBUS: &str = "/org/freedesktop/DBus";
}

/// D-Bus interface names.
pub mod interfaces {
    pub const AUTHORITY: &str = "org.freedesktop.PolicyKit1.Authority";
    pub const DBUS: &str = "org.freedesktop.DBus";
}

/// Authorization source backed by polkit's `CheckAuthorization` call.
pub struct PolkitAuthority {
    connection: Connection,
    action_id: String,
}

impl PolkitAuthority {
    /// Connect to the system bus and verify polkit is actually there.
    pub fn connect(action_id: &str) -> Result<Self> {
        let connection = Connection::system()
            .context("Failed to connect to system D-Bus")?;

        // Probe before use so hosts without a polkit service are detected at
        // startup rather than on the first query.
        let owned: bool = connection
            .call_method(
                Some(interfaces::DBUS),
                paths::DBUS,
                Some(interfaces::DBUS),
                "NameHasOwner",
                &(BUS_NAME,),
            )?
            .body()
            .deserialize()?;
        if !owned {
            anyhow::bail!("{} is not on the system bus", BUS_NAME);
        }

        Ok(Self {
            connection,
            action_id: action_id.to_string(),
        })
    }
}

impl AuthoritySource for PolkitAuthority {
    fn query_mode(&self, who: &CallerIdentity) -> Result<AuthorizationMode> {
        let mut subject_details: HashMap<&str, Value> = HashMap::new();
        subject_details.insert("pid", Value::from(who.pid));
        subject_details.insert("start-time", Value::from(who.start_time));
        subject_details.insert("uid", Value::from(who.uid as i32));
        let subject = ("unix-process", subject_details);

        let mut details: HashMap<&str, &str> = HashMap::new();
        details.insert("application", who.app_id.as_str());

        // flags = 0: a query must never pop an interactive authentication
        // dialog; that is a separate flow.
        let (is_authorized, is_challenge, _details): (bool, bool, HashMap<String, String>) =
            self.connection
                .call_method(
                    Some(BUS_NAME),
                    paths::AUTHORITY,
                    Some(interfaces::AUTHORITY),
                    "CheckAuthorization",
                    &(subject, self.action_id.as_str(), details, 0u32, ""),
                )
                .context("CheckAuthorization call failed")?
                .body()
                .deserialize()
                .context("Malformed CheckAuthorization reply")?;

        Ok(if is_authorized {
            AuthorizationMode::Allowed
        } else if is_challenge {
            AuthorizationMode::Challenge
        } else {
            AuthorizationMode::Denied
        })
    }

    fn name(&self) -> &'static str {
        "polkit"
    }
}
