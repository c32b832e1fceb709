// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::registry::Difficulty;

/// A single downloadable artifact of a challenge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChallengeFile {
    /// Path relative to the challenge's asset directory, always `/`-separated
    pub name: String,
    /// Public download path
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// SSH access to a live challenge box.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SshCredentials {
    /// Empty until the API resolves it for a specific request
    #[serde(default)]
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// A web platform a challenge is played against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlatformUrl {
    /// Empty until the API resolves it for a specific request
    #[serde(default)]
    pub host: String,
    pub port: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub short_description: String,
    #[serde(default)]
    pub files: Vec<ChallengeFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_credentials: Option<SshCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_url: Option<PlatformUrl>,
    pub available: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Challenge {
    /// Replaces the host of every declared endpoint, challenges without one are unchanged.
    pub fn with_host(mut self, host: &str) -> Self {
        if let Some(ssh) = self.ssh_credentials.as_mut() {
            ssh.host = host.to_string();
        }
        if let Some(platform) = self.platform_url.as_mut() {
            platform.host = host.to_string();
        }
        self
    }
}

/// A challenge is playable once it has something to download or something to connect to.
pub fn is_available(
    files: &[ChallengeFile],
    ssh_credentials: Option<&SshCredentials>,
    platform_url: Option<&PlatformUrl>,
) -> bool {
    !files.is_empty() || ssh_credentials.is_some() || platform_url.is_some()
}

/// Category is everything before the first hyphen of the slug.
pub fn category_from_slug(slug: &str) -> String {
    slug.split('-').next().unwrap_or_default().to_string()
}

/// `web-01-royalmint` becomes `Web 01 Royalmint`. Every word start inside a part is
/// capitalised too, so `a.b` becomes `A.B`.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .map(capitalize_words)
        .collect::<Vec<String>>()
        .join(" ")
}

fn capitalize_words(part: &str) -> String {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut prev_is_word = false;
    part.chars()
        .map(|c| {
            let word = is_word(c);
            let c = if word && !prev_is_word {
                c.to_ascii_uppercase()
            } else {
                c
            };
            prev_is_word = word;
            c
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("web-01-royalmint"), "Web 01 Royalmint");
        assert_eq!(title_from_slug("mob-01"), "Mob 01");
        assert_eq!(title_from_slug("single"), "Single");
    }

    #[test]
    fn test_title_capitalises_each_word_in_a_part() {
        assert_eq!(title_from_slug("a.b-c_d"), "A.B C_d");
        assert_eq!(title_from_slug("net-02-doh.rhythm"), "Net 02 Doh.Rhythm");
        assert_eq!(title_from_slug("x--y"), "X  Y");
    }

    #[test]
    fn test_category_from_slug() {
        assert_eq!(category_from_slug("crypto-02-vault-breach"), "crypto");
        assert_eq!(category_from_slug("nohyphen"), "nohyphen");
    }

    #[test]
    fn test_availability() {
        let file = ChallengeFile {
            name: "a.txt".to_string(),
            url: "/static/challenge-files/x/a.txt".to_string(),
            size: Some(3),
        };
        let platform = PlatformUrl {
            host: String::new(),
            port: 5001,
        };
        assert!(!is_available(&[], None, None));
        assert!(is_available(&[file], None, None));
        assert!(is_available(&[], None, Some(&platform)));
    }

    #[test]
    fn test_camel_case_json_omits_absent_endpoints() {
        let challenge = Challenge {
            slug: "sc-01".to_string(),
            title: "Sc 01".to_string(),
            category: "sc".to_string(),
            difficulty: Difficulty::Easy,
            points: 100,
            short_description: "desc".to_string(),
            files: vec![],
            ssh_credentials: None,
            platform_url: None,
            available: false,
            tags: vec!["sc".to_string()],
        };
        let json = serde_json::to_value(&challenge).unwrap();
        assert_eq!(json["shortDescription"], "desc");
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("sshCredentials").is_none());
        assert!(json.get("platformUrl").is_none());
    }
}
