// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Compiled-in challenge metadata: narratives, difficulty tiers and the story order
//! the landing page presents challenges in.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 250,
            Difficulty::Hard => 500,
            Difficulty::Unknown => 0,
        }
    }

    /// Primary sort key of the catalog, easy first.
    pub fn sort_rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Unknown => 4,
        }
    }

    /// Anything that is not a known tier is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Unknown,
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        Difficulty::parse(&value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const FALLBACK_DESCRIPTION: &str = "Challenge files available for download.";

#[derive(Debug, Clone, Copy)]
pub struct ChallengeMetadata {
    pub slug: &'static str,
    pub story: &'static str,
    pub difficulty: Difficulty,
}

/// Listed in narrative order; the position in this table is the secondary sort key.
const CHALLENGES: &[ChallengeMetadata] = &[
    ChallengeMetadata {
        slug: "re-01-confession-app",
        story: "The Directorate issues its agents a journaling app called \"Confession App\" for \"well-being tracking.\" But the Professor suspects it hides secret operational logs. The team obtains the binary and reverse engineers it, decrypting obfuscated strings to find a hardcoded passphrase. When entered correctly, the app connects to a hidden server and reveals the first clue: the location of the Directorate's network gateway.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "re-02-evidence-tampering",
        story: "Berlin discovers a heavily obfuscated binary called \"Evidence Tampering Console\" used by the Directorate's internal cleanup unit. The stripped binary contains encrypted strings and timestamp manipulation logic. Reverse engineering reveals the validation algorithm\u{2014}players must derive the correct tampered timestamp that passes the Directorate's rewrite verification. This confirms they systematically rewrite digital history, critical intel for staging the heist without raising alarms.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "mob-01",
        story: "To infiltrate the Directorate's mobile ecosystem, Rio obtains an Android cloud backup of an operative's phone. The team extracts deleted SMS threads containing network authentication hints. These form the first foothold into their infrastructure.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "mob-02",
        story: "Tokyo uncovers a Directorate \"Safety App\" secretly tracking citizens. APK analysis identifies the tracking API endpoint\u{2014}a covert beacon server that doubles as a clandestine command channel. This beacon server becomes the crew's entry tunnel.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "df-01-night-walk-photo",
        story: "A Directorate field agent posts a photo online. The crew performs EXIF reconstruction and metadata analysis, revealing a hidden operational unit behind the agent. This confirms multiple nodes in the Directorate\u{2019}s surveillance chain.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "df-02-burned-usb",
        story: "A half-destroyed USB stick retrieved by Nairobi contains scrambled operational files. File carving reveals a fragmented network diagram of the Directorate\u{2019}s core systems\u{2014}the digital equivalent of the Royal Mint blueprint.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "web-01-royalmint",
        story: "Behind a public memorial page, Denver brute-forces directories and finds deleted policy documents explaining how A\u{2080} automates digital manipulation. This is proof the AI exists.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "web-02-ticket-to-the-vault",
        story: "The Directorate's \"tip portal\" is vulnerable to SQLi/IDOR. The crew reads internally filed reports and finds an anonymous complaint from a whistleblower describing the system architecture.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "web-03-safehouse",
        story: "The Professor identifies the crew's final web target: the Directorate's internal network scanner with a hidden vault server. Helsinki discovers an SSRF vulnerability in the URL preview feature. Using a clever allowlist bypass with the @ character, the crew pivots to an internal-only service and retrieves the Professor's hidden escape route coordinates. This demonstrates how deeply the Directorate's systems can be compromised through chained vulnerabilities.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "crypto-01-intercepted-comms",
        story: "An operative's encrypted notes use a weak cipher. Decrypting them reveals internal codenames for A\u{2080} submodules.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "crypto-02-vault-breach",
        story: "Lisbon identifies an AES-encrypted memo. Using known plaintext structures, the crew recovers a name: The Directorate's chief architect. They now know who built A\u{2080}.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "crypto-03-quantum-safe",
        story: "The Directorate's RSA vault uses poor padding. The crew factors it and extracts the master key index, giving theoretical access to the Digital Vault. The final heist phase begins.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "net-01-onion-pcap",
        story: "Tokyo recovers a span-port PCAP from a compromised switch. The payloads are noise, but the headers aren\u{2019}t: VLAN + GRE tunnels and timestamp patterns hide a deliberate signal. Rebuild the hidden message and identify the rogue engineer feeding \u{394}\u{2080}.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "net-02-doh-rhythm",
        story: "The Directorate claims their DNS is \u{201c}safe\u{201d} because it\u{2019}s encrypted. Nairobi spots a rhythm in TLS record sizes and timing\u{2014}an exfil channel hiding in metadata. Reconstruct the message without decrypting anything and extract the tunnel key.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "sc-01",
        story: "An educational portal used by Directorate interns contains an input flaw leaking internal communications. These messages contain API tokens for the development server.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "sc-02",
        story: "The crew analyzes a file-upload backend that silently overwrites files. This vulnerability becomes their method to replace surveillance logs with fabricated decoy logs\u{2014}the same tactic the Directorate used, now turned against them.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "exp-01",
        story: "A compromised Directorate laptop is locked, but privilege escalation gives the crew access. Inside they find local credentials for the AI training environment.",
        difficulty: Difficulty::Medium,
    },
    ChallengeMetadata {
        slug: "exp-02",
        story: "This is the final vault. A chained exploit grants root access to the Directorate's central server. Inside, they uncover: the full A\u{2080} source code, the training dataset, communication logs, and instructions for future mass surveillance rollouts. This is the digital equivalent of breaking into the Bank of Spain's gold vault.",
        difficulty: Difficulty::Hard,
    },
    ChallengeMetadata {
        slug: "ai-01-artemis",
        story: "The team analyzes chat logs between agents and the A\u{2080} system. Patterns show the AI has been impersonating human field officers, steering decisions. A\u{2080} is not just a tool. It is an autonomous strategist\u{2014}like a digital Alicia Sierra.",
        difficulty: Difficulty::Easy,
    },
    ChallengeMetadata {
        slug: "ai-02-cerberus",
        story: "The final revelation: A\u{2080} generates deepfake audio messages to mislead operatives and shape narratives. The crew identifies inconsistencies and proves the system manipulates internal command structures. The world must see this.",
        difficulty: Difficulty::Hard,
    },
];

pub fn lookup(slug: &str) -> Option<&'static ChallengeMetadata> {
    CHALLENGES.iter().find(|c| c.slug == slug)
}

pub fn known_slugs() -> impl Iterator<Item = &'static str> {
    CHALLENGES.iter().map(|c| c.slug)
}

pub fn difficulty_of(slug: &str) -> Difficulty {
    lookup(slug).map(|c| c.difficulty).unwrap_or_default()
}

pub fn story_of(slug: &str) -> &'static str {
    lookup(slug)
        .map(|c| c.story)
        .unwrap_or(FALLBACK_DESCRIPTION)
}

/// Position in the story; slugs outside of it share the last rank.
pub fn narrative_rank(slug: &str) -> usize {
    CHALLENGES
        .iter()
        .position(|c| c.slug == slug)
        .unwrap_or(usize::MAX)
}
