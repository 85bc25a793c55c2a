use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod payload;

pub use payload::{Header, MessagePart, PartBody, RawMessage};

/// Decoded email, ready for correlation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub subject: String,
    pub body: String, // decoded plain text, "" when nothing could be extracted
    pub received_at: Option<DateTime<Utc>>,
    pub is_system_notification: bool,
}

impl Message {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            received_at: None,
            is_system_notification: false,
        }
    }
}

/// Read-only view of a board card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub labels: BTreeSet<String>,
    /// Name of the list (column) holding the card, when known
    pub status: Option<String>,
}

impl Card {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Exact, case-sensitive label membership
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Case-insensitive comparison of the trimmed card title with `title`
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    Description,
    Status,
}

impl CardField {
    pub fn as_str(&self) -> &str {
        match self {
            CardField::Description => "description",
            CardField::Status => "status",
        }
    }
}

/// A mismatch between mailbox state and board state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingCard {
        subject: String,
        expected_title: String,
    },
    MissingLabel {
        card_title: String,
        subject: Option<String>,
        label: String,
    },
    MissingBody {
        subject: String,
        card_title: String,
        body: String,
    },
    FieldMismatch {
        card_title: String,
        field: CardField,
        expected: String,
        actual: String,
    },
    NoLabelledCards {
        keyword: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingCard {
                subject,
                expected_title,
            } => write!(
                f,
                "No card found for email with subject '{}' (expected card title '{}')",
                subject, expected_title
            ),
            Violation::MissingLabel {
                card_title,
                subject: Some(subject),
                label,
            } => write!(
                f,
                "Card '{}' for email '{}' does not have '{}' label",
                card_title, subject, label
            ),
            Violation::MissingLabel {
                card_title,
                subject: None,
                label,
            } => write!(f, "Card '{}' does not have '{}' label", card_title, label),
            Violation::MissingBody {
                subject,
                card_title,
                body,
            } => write!(
                f,
                "Body '{}' not found in description of card '{}' (subject '{}')",
                body, card_title, subject
            ),
            Violation::FieldMismatch {
                card_title,
                field,
                expected,
                actual,
            } => write!(
                f,
                "Card '{}': expected {} '{}', got '{}'",
                card_title,
                field.as_str(),
                expected,
                actual
            ),
            Violation::NoLabelledCards { keyword } => {
                write!(f, "No cards with a '{}' label found", keyword)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    UrgentMapping,
    MergedDescriptions,
    ExpectedCard,
    LabelledCards,
}

impl CheckKind {
    pub fn as_str(&self) -> &str {
        match self {
            CheckKind::UrgentMapping => "urgent_mapping",
            CheckKind::MergedDescriptions => "merged_descriptions",
            CheckKind::ExpectedCard => "expected_card",
            CheckKind::LabelledCards => "labelled_cards",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Skipped,
    Failed,
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Passed => "passed",
            Verdict::Skipped => "skipped",
            Verdict::Failed => "failed",
        }
    }
}

/// Result of one comparison pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub kind: CheckKind,
    /// Messages, groups or cards that met the check's precondition
    pub candidates: usize,
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            candidates: 0,
            violations: Vec::new(),
        }
    }

    /// No candidates means inconclusive, which is distinct from a mismatch
    pub fn verdict(&self) -> Verdict {
        if !self.violations.is_empty() {
            Verdict::Failed
        } else if self.candidates == 0 {
            Verdict::Skipped
        } else {
            Verdict::Passed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_matches_trims_and_ignores_case() {
        let card = Card::new("  Summarize The Meeting ", "");
        assert!(card.title_matches("summarize the meeting"));
        assert!(!card.title_matches("summarize"));
    }

    #[test]
    fn test_has_label_is_case_sensitive() {
        let card = Card::new("X", "").with_label("Urgent");
        assert!(card.has_label("Urgent"));
        assert!(!card.has_label("urgent"));
    }

    #[test]
    fn test_verdict() {
        let mut report = CheckReport::new(CheckKind::UrgentMapping);
        assert_eq!(report.verdict(), Verdict::Skipped);

        report.candidates = 2;
        assert_eq!(report.verdict(), Verdict::Passed);

        report.violations.push(Violation::NoLabelledCards {
            keyword: "urgent".to_string(),
        });
        assert_eq!(report.verdict(), Verdict::Failed);
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::MissingBody {
            subject: "Bug".to_string(),
            card_title: "Bug".to_string(),
            body: "B".to_string(),
        };
        assert_eq!(
            v.to_string(),
            "Body 'B' not found in description of card 'Bug' (subject 'Bug')"
        );

        let v = Violation::MissingLabel {
            card_title: "X".to_string(),
            subject: None,
            label: "New".to_string(),
        };
        assert_eq!(v.to_string(), "Card 'X' does not have 'New' label");
    }

    #[test]
    fn test_violation_serde_tag() {
        let v = Violation::MissingCard {
            subject: "Task: X".to_string(),
            expected_title: "X".to_string(),
        };
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"missing_card","subject":"Task: X","expected_title":"X"}"#
        );
    }
}
