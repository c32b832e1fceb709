// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Works out which host a client should use to reach challenge endpoints.
//!
//! The answer depends on how the client reached us, so it is computed per request and
//! never stored.

use hyper::{HeaderMap, Uri, http::uri::Authority};

pub const FALLBACK_HOST: &str = "localhost";

/// Everything a strategy may look at, captured from the config and one request.
#[derive(Debug, Clone, Default)]
pub struct HostInputs<'a> {
    pub configured: Option<&'a str>,
    pub forwarded_host: Option<&'a str>,
    pub request_host: Option<&'a str>,
    pub server_hostname: Option<&'a str>,
}

impl<'a> HostInputs<'a> {
    pub fn from_request(
        configured: Option<&'a str>,
        server_hostname: Option<&'a str>,
        headers: &'a HeaderMap,
        uri: &'a Uri,
    ) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            configured,
            forwarded_host: header("x-forwarded-host")
                .and_then(|v| v.split(',').next())
                .map(str::trim),
            request_host: header("host").or_else(|| uri.authority().map(Authority::as_str)),
            server_hostname,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    Configured,
    ForwardedHost,
    RequestHost,
    ServerHostname,
}

impl HostStrategy {
    pub const DEFAULT_ORDER: [HostStrategy; 4] = [
        HostStrategy::Configured,
        HostStrategy::ForwardedHost,
        HostStrategy::RequestHost,
        HostStrategy::ServerHostname,
    ];

    pub fn resolve(&self, inputs: &HostInputs<'_>) -> Option<String> {
        match self {
            HostStrategy::Configured => non_empty(inputs.configured).map(str::to_string),
            HostStrategy::ForwardedHost => non_empty(inputs.forwarded_host).and_then(strip_port),
            HostStrategy::RequestHost => non_empty(inputs.request_host).and_then(strip_port),
            HostStrategy::ServerHostname => non_empty(inputs.server_hostname).map(str::to_string),
        }
    }
}

/// Tries each strategy in order, falling back to `localhost`.
pub fn resolve_host(strategies: &[HostStrategy], inputs: &HostInputs<'_>) -> String {
    strategies
        .iter()
        .find_map(|strategy| strategy.resolve(inputs))
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `10.0.0.5:4000` -> `10.0.0.5`, `[::1]:4000` -> `[::1]`
fn strip_port(value: &str) -> Option<String> {
    match value.parse::<Authority>() {
        Ok(authority) => Some(authority.host().to_string()),
        Err(e) => {
            tracing::debug!("Ignoring unparsable host {value:?}: {e}");
            None
        }
    }
}
