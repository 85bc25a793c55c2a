//! Denylist of subject keywords that mark system / security / non-task mail.

use serde::{Deserialize, Serialize};

/// Default keywords, English and Hebrew sign-in / verification notices
pub const DEFAULT_SYSTEM_KEYWORDS: &[&str] = &[
    "security",
    "verify",
    "verification",
    "sign-in",
    "sign in",
    "google account",
    "you're trying to",
    "verifying it's you",
    "verification code",
    "התראת",
    "אימות",
    "Set your new Atlassian password",
];

/// Case-insensitive keyword set, lowercased once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SystemKeywords {
    keywords: Vec<String>,
}

impl SystemKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            keywords: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// A keyword occurs somewhere in the subject
    pub fn matches_subject(&self, subject: &str) -> bool {
        let subject = subject.to_lowercase();
        self.keywords.iter().any(|k| subject.contains(k.as_str()))
    }

    /// A keyword occurs in the subject, or the whole subject occurs in a keyword.
    /// An empty subject never matches.
    pub fn matches_either_direction(&self, subject: &str) -> bool {
        let subject = subject.trim().to_lowercase();
        if subject.is_empty() {
            return false;
        }
        self.keywords
            .iter()
            .any(|k| subject.contains(k.as_str()) || k.contains(subject.as_str()))
    }
}

impl Default for SystemKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_KEYWORDS)
    }
}

impl From<Vec<String>> for SystemKeywords {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<SystemKeywords> for Vec<String> {
    fn from(keywords: SystemKeywords) -> Self {
        keywords.keywords
    }
}
