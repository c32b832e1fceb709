// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod config;
pub mod db;
pub mod host;
pub mod routes;
pub mod store;
