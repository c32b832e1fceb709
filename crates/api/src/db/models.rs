// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tdhctf_catalog::{Challenge, Difficulty};
use uuid::Uuid;

use super::schema::*;

/* =========================
 * CHALLENGES
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChallengeRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i32,
    pub short_description: String,
    pub files: serde_json::Value,
    pub ssh_credentials: Option<serde_json::Value>,
    pub platform_url: Option<serde_json::Value>,
    pub tags: Vec<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = challenges)]
pub struct NewChallenge {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i32,
    pub short_description: String,
    pub files: serde_json::Value,
    pub ssh_credentials: Option<serde_json::Value>,
    pub platform_url: Option<serde_json::Value>,
    pub tags: Vec<String>,
    pub available: bool,
}

impl TryFrom<ChallengeRow> for Challenge {
    type Error = serde_json::Error;

    fn try_from(row: ChallengeRow) -> Result<Self, Self::Error> {
        Ok(Challenge {
            slug: row.slug,
            title: row.title,
            category: row.category,
            difficulty: Difficulty::parse(&row.difficulty),
            points: u32::try_from(row.points).unwrap_or(0),
            short_description: row.short_description,
            files: serde_json::from_value(row.files)?,
            ssh_credentials: row.ssh_credentials.map(serde_json::from_value).transpose()?,
            platform_url: row.platform_url.map(serde_json::from_value).transpose()?,
            available: row.available,
            tags: row.tags,
        })
    }
}

impl TryFrom<&Challenge> for NewChallenge {
    type Error = serde_json::Error;

    fn try_from(challenge: &Challenge) -> Result<Self, Self::Error> {
        Ok(NewChallenge {
            slug: challenge.slug.clone(),
            title: challenge.title.clone(),
            category: challenge.category.clone(),
            difficulty: challenge.difficulty.to_string(),
            points: i32::try_from(challenge.points).unwrap_or(i32::MAX),
            short_description: challenge.short_description.clone(),
            files: serde_json::to_value(&challenge.files)?,
            ssh_credentials: challenge
                .ssh_credentials
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            platform_url: challenge
                .platform_url
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            tags: challenge.tags.clone(),
            available: challenge.available,
        })
    }
}
