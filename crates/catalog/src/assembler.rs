// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::{
    endpoints::{platform_url_for, ssh_credentials_for},
    model::{Challenge, ChallengeFile, category_from_slug, is_available, title_from_slug},
    registry, scanner,
};

pub const DEFAULT_FILES_URL_PREFIX: &str = "/static/challenge-files";

/// Builds the full challenge catalog from the asset directory and the compiled-in registry.
#[derive(Debug, Clone)]
pub struct Assembler {
    pub files_dir: PathBuf,
    /// Public path the asset directory is served under
    pub url_prefix: String,
}

impl Assembler {
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self {
            files_dir: files_dir.into(),
            url_prefix: DEFAULT_FILES_URL_PREFIX.to_string(),
        }
    }

    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Every challenge known either from the filesystem or the registry, sorted.
    pub fn assemble(&self) -> Vec<Challenge> {
        let slugs: BTreeSet<String> = scanner::discover_slugs(&self.files_dir)
            .into_iter()
            .chain(registry::known_slugs().map(str::to_string))
            .collect();

        let mut challenges: Vec<Challenge> = slugs
            .iter()
            .map(|slug| self.assemble_challenge(slug))
            .collect();
        sort_challenges(&mut challenges);
        challenges
    }

    pub fn assemble_challenge(&self, slug: &str) -> Challenge {
        let category = category_from_slug(slug);
        let files: Vec<ChallengeFile> = scanner::scan_challenge_files(&self.files_dir, slug)
            .into_iter()
            .map(|file| ChallengeFile {
                url: format!("{}/{}/{}", self.url_prefix, slug, file.relative_path),
                size: scanner::file_size(&file.full_path),
                name: file.relative_path,
            })
            .collect();
        let difficulty = registry::difficulty_of(slug);
        let ssh_credentials = ssh_credentials_for(slug);
        let platform_url = platform_url_for(slug);
        let available = is_available(&files, ssh_credentials.as_ref(), platform_url.as_ref());

        Challenge {
            slug: slug.to_string(),
            title: title_from_slug(slug),
            tags: vec![category.clone()],
            category,
            difficulty,
            points: difficulty.points(),
            short_description: registry::story_of(slug).to_string(),
            files,
            ssh_credentials,
            platform_url,
            available,
        }
    }
}

/// Orders by difficulty, then by position in the story, then by slug.
pub fn sort_challenges(challenges: &mut [Challenge]) {
    challenges.sort_by(|a, b| {
        a.difficulty
            .sort_rank()
            .cmp(&b.difficulty.sort_rank())
            .then_with(|| registry::narrative_rank(&a.slug).cmp(&registry::narrative_rank(&b.slug)))
            .then_with(|| a.slug.cmp(&b.slug))
    });
}
