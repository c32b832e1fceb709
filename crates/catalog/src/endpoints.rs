// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::model::{PlatformUrl, SshCredentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Ssh {
        port: u16,
        username: &'static str,
        password: &'static str,
    },
    Platform {
        port: u16,
    },
}

/// Live services that specific challenges are wired to. Hosts are not part of this
/// table, they are resolved per request by the API.
const ENDPOINTS: &[(&str, Endpoint)] = &[
    (
        "re-01-confession-app",
        Endpoint::Ssh {
            port: 2222,
            username: "rio",
            password: "RedCipher@1",
        },
    ),
    (
        "re-02-evidence-tampering",
        Endpoint::Ssh {
            port: 2223,
            username: "denver",
            password: "RedCipher@2",
        },
    ),
    ("ai-01-artemis", Endpoint::Platform { port: 8080 }),
    ("ai-02-cerberus", Endpoint::Platform { port: 8081 }),
    ("web-01-royalmint", Endpoint::Platform { port: 5001 }),
    ("web-02-ticket-to-the-vault", Endpoint::Platform { port: 5002 }),
    ("web-03-safehouse", Endpoint::Platform { port: 5003 }),
];

pub fn endpoints_for(slug: &str) -> impl Iterator<Item = &'static Endpoint> {
    ENDPOINTS
        .iter()
        .filter(move |(s, _)| *s == slug)
        .map(|(_, endpoint)| endpoint)
}

pub fn ssh_credentials_for(slug: &str) -> Option<SshCredentials> {
    endpoints_for(slug).find_map(|endpoint| match *endpoint {
        Endpoint::Ssh {
            port,
            username,
            password,
        } => Some(SshCredentials {
            host: String::new(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        }),
        Endpoint::Platform { .. } => None,
    })
}

pub fn platform_url_for(slug: &str) -> Option<PlatformUrl> {
    endpoints_for(slug).find_map(|endpoint| match *endpoint {
        Endpoint::Platform { port } => Some(PlatformUrl {
            host: String::new(),
            port,
        }),
        Endpoint::Ssh { .. } => None,
    })
}
