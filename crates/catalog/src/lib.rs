// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod assembler;
pub mod endpoints;
pub mod model;
pub mod registry;
pub mod scanner;

pub use assembler::{Assembler, sort_challenges};
pub use model::{Challenge, ChallengeFile, PlatformUrl, SshCredentials};
pub use registry::Difficulty;
