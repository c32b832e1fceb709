// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// `/`-separated path relative to the challenge directory
    pub relative_path: String,
    pub full_path: PathBuf,
}

/// Names of the immediate sub-directories of `base_dir`, sorted.
pub fn discover_slugs(base_dir: &Path) -> Vec<String> {
    let mut slugs = Vec::new();
    if !base_dir.is_dir() {
        return slugs;
    }
    let entries = match std::fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                "Failed to read challenge files directory {}: {}",
                base_dir.to_string_lossy(),
                e
            );
            return slugs;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        slugs.push(entry.file_name().to_string_lossy().to_string());
    }
    slugs.sort();
    slugs
}

/// Recursively lists every regular file below `base_dir/slug`.
///
/// Entries are visited in file name order, so an unchanged tree always scans the same way.
/// A missing directory is not an error and yields no files.
pub fn scan_challenge_files(base_dir: &Path, slug: &str) -> Vec<ScannedFile> {
    let challenge_dir = base_dir.join(slug);
    let mut files = Vec::new();
    if !challenge_dir.is_dir() {
        return files;
    }

    let walker = WalkBuilder::new(&challenge_dir)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in challenge {}: {}", slug, e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&challenge_dir) else {
            continue;
        };
        files.push(ScannedFile {
            relative_path: to_url_path(relative),
            full_path: path.to_path_buf(),
        });
    }

    files
}

fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Size of a file, if it can be determined.
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
