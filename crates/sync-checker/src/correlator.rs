//! Comparison of mailbox snapshots against board snapshots.
//!
//! Every check is a pure, single pass over already-fetched data. A check with
//! no candidates reports `Verdict::Skipped` rather than passing or failing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sync_types::{Card, CardField, CheckKind, CheckReport, Message, Violation};

use crate::keywords::SystemKeywords;
use crate::normalize::normalize_title;

/// Messages that share one raw subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectGroup {
    pub subject: String,
    pub normalized_title: String,
    pub bodies: Vec<String>,
}

/// A card that must exist on the board with the given properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpectation {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Correlator {
    keywords: SystemKeywords,
    /// Body substring that flags a message as urgent (case-insensitive)
    urgent_keyword: String,
    /// Label an urgent message's card must carry (exact match)
    urgent_label: String,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(SystemKeywords::default())
    }
}

impl Correlator {
    pub fn new(keywords: SystemKeywords) -> Self {
        Self {
            keywords,
            urgent_keyword: "urgent".to_string(),
            urgent_label: "Urgent".to_string(),
        }
    }

    pub fn with_urgent(mut self, keyword: impl Into<String>, label: impl Into<String>) -> Self {
        self.urgent_keyword = keyword.into().to_lowercase();
        self.urgent_label = label.into();
        self
    }

    /// Every urgent message must map to a card carrying the urgent label
    pub fn check_urgent_mapping(&self, messages: &[Message], cards: &[Card]) -> CheckReport {
        let mut report = CheckReport::new(CheckKind::UrgentMapping);

        let urgent: Vec<&Message> = messages
            .iter()
            .filter(|m| !self.keywords.matches_subject(&m.subject))
            .filter(|m| {
                m.body
                    .trim()
                    .to_lowercase()
                    .contains(self.urgent_keyword.as_str())
            })
            .collect();

        report.candidates = urgent.len();
        tracing::info!("Found {} urgent messages", urgent.len());

        for message in urgent {
            let title = normalize_title(&message.subject);

            let Some(card) = find_card(cards, &title) else {
                report.violations.push(Violation::MissingCard {
                    subject: message.subject.clone(),
                    expected_title: title,
                });
                continue;
            };

            if !card.has_label(&self.urgent_label) {
                report.violations.push(Violation::MissingLabel {
                    card_title: card.title.clone(),
                    subject: Some(message.subject.clone()),
                    label: self.urgent_label.clone(),
                });
            }
        }

        report
    }

    /// Group mergeable messages by their raw subject, first-seen order.
    /// Only subjects with more than one message are returned.
    pub fn merge_groups(&self, messages: &[Message]) -> Vec<SubjectGroup> {
        let mut groups: Vec<SubjectGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for message in messages {
            let subject = message.subject.trim();
            let body = message.body.trim();

            if subject.is_empty() || body.is_empty() {
                continue;
            }
            if self.keywords.matches_either_direction(subject) {
                tracing::debug!("Skipping system message: {}", subject);
                continue;
            }

            let slot = *index.entry(subject.to_string()).or_insert_with(|| {
                groups.push(SubjectGroup {
                    subject: subject.to_string(),
                    normalized_title: normalize_title(subject),
                    bodies: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].bodies.push(body.to_string());
        }

        groups.retain(|g| g.bodies.len() > 1);
        groups
    }

    /// Messages sharing a subject must be merged into one card whose
    /// description contains every body verbatim
    pub fn check_merged_descriptions(&self, messages: &[Message], cards: &[Card]) -> CheckReport {
        let mut report = CheckReport::new(CheckKind::MergedDescriptions);

        let groups = self.merge_groups(messages);
        report.candidates = groups.len();
        tracing::info!("Found {} subjects requiring a merge", groups.len());

        for group in groups {
            let Some(card) = find_card(cards, &group.normalized_title) else {
                report.violations.push(Violation::MissingCard {
                    subject: group.subject,
                    expected_title: group.normalized_title,
                });
                continue;
            };

            for body in &group.bodies {
                if !card.description.contains(body.as_str()) {
                    report.violations.push(Violation::MissingBody {
                        subject: group.subject.clone(),
                        card_title: group.normalized_title.clone(),
                        body: body.clone(),
                    });
                }
            }
        }

        report
    }

    /// At least one card must carry a label containing the urgent keyword
    pub fn check_labelled_cards_present(&self, cards: &[Card]) -> CheckReport {
        let mut report = CheckReport::new(CheckKind::LabelledCards);
        report.candidates = cards.len();

        let labelled: Vec<&Card> = cards
            .iter()
            .filter(|c| {
                c.labels
                    .iter()
                    .any(|l| l.to_lowercase().contains(self.urgent_keyword.as_str()))
            })
            .collect();

        for card in &labelled {
            tracing::info!("Card '{}' is labelled {}", card.title, self.urgent_keyword);
        }

        if !cards.is_empty() && labelled.is_empty() {
            report.violations.push(Violation::NoLabelledCards {
                keyword: self.urgent_keyword.clone(),
            });
        }

        report
    }
}

/// A specific card must exist with the expected fields
pub fn check_expected_card(expectation: &CardExpectation, cards: &[Card]) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::ExpectedCard);
    report.candidates = cards.len();
    if cards.is_empty() {
        return report;
    }

    let title = expectation.title.trim();
    let Some(card) = cards.iter().find(|c| c.title.trim() == title) else {
        report.violations.push(Violation::MissingCard {
            subject: expectation.title.clone(),
            expected_title: title.to_string(),
        });
        return report;
    };

    if let Some(expected) = &expectation.description {
        let actual = card.description.trim();
        if actual != expected.trim() {
            report.violations.push(Violation::FieldMismatch {
                card_title: card.title.clone(),
                field: CardField::Description,
                expected: expected.clone(),
                actual: actual.to_string(),
            });
        }
    }

    if let Some(expected) = &expectation.status {
        let actual = card.status.as_deref().unwrap_or_default();
        if actual != expected {
            report.violations.push(Violation::FieldMismatch {
                card_title: card.title.clone(),
                field: CardField::Status,
                expected: expected.clone(),
                actual: actual.to_string(),
            });
        }
    }

    if let Some(label) = &expectation.label {
        if !card.has_label(label) {
            report.violations.push(Violation::MissingLabel {
                card_title: card.title.clone(),
                subject: None,
                label: label.clone(),
            });
        }
    }

    report
}

fn find_card<'a>(cards: &'a [Card], title: &str) -> Option<&'a Card> {
    cards.iter().find(|c| c.title_matches(title))
}
