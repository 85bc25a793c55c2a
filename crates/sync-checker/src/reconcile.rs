//! One reconciliation pass: fetch both snapshots, then run the requested checks.

use sync_types::{Card, CheckKind, CheckReport, Message, Verdict};

use crate::config::ChecksConfig;
use crate::correlator::{check_expected_card, CardExpectation, Correlator};
use crate::error::{CheckError, Result};
use crate::extract::extract_message;
use crate::keywords::SystemKeywords;
use crate::sources::{CardSource, MailSource};

/// Fetch and decode every listed message, one at a time
pub async fn collect_messages(
    source: &dyn MailSource,
    keywords: &SystemKeywords,
) -> Result<Vec<Message>> {
    let ids = source.list_message_ids().await?;
    let mut messages = Vec::with_capacity(ids.len());

    for id in ids {
        let raw = source.get_message(&id).await?;
        let message = extract_message(&raw, keywords);
        if message.is_system_notification {
            tracing::debug!("Message {} looks like a system notification", message.id);
        }
        messages.push(message);
    }

    Ok(messages)
}

/// Checks that compare messages and therefore need a mail source
pub fn needs_mail(kind: CheckKind) -> bool {
    matches!(kind, CheckKind::UrgentMapping | CheckKind::MergedDescriptions)
}

pub struct Reconciler {
    keywords: SystemKeywords,
    correlator: Correlator,
    expectations: Vec<CardExpectation>,
}

impl Reconciler {
    pub fn new(checks: &ChecksConfig) -> Self {
        Self {
            keywords: checks.system_keywords.clone(),
            correlator: Correlator::new(checks.system_keywords.clone())
                .with_urgent(&checks.urgent_keyword, &checks.urgent_label),
            expectations: checks.expected_cards.clone(),
        }
    }

    /// Run `kinds` against fresh snapshots. The mail source is only consulted
    /// when a requested check compares messages.
    pub async fn run(
        &self,
        kinds: &[CheckKind],
        mail: Option<&dyn MailSource>,
        board: &dyn CardSource,
    ) -> Result<Vec<CheckReport>> {
        let messages = if kinds.iter().any(|k| needs_mail(*k)) {
            let mail = mail.ok_or_else(|| {
                CheckError::Config("a mail source is required for message checks".to_string())
            })?;
            let messages = collect_messages(mail, &self.keywords).await?;
            tracing::info!("Collected {} messages", messages.len());
            messages
        } else {
            Vec::new()
        };

        let cards = board.fetch_cards().await?;
        tracing::info!("Collected {} cards", cards.len());

        let reports = self.evaluate(kinds, &messages, &cards);
        for report in &reports {
            log_report(report);
        }
        Ok(reports)
    }

    /// Pure comparison over already-fetched snapshots
    pub fn evaluate(
        &self,
        kinds: &[CheckKind],
        messages: &[Message],
        cards: &[Card],
    ) -> Vec<CheckReport> {
        let mut reports = Vec::new();

        for kind in kinds {
            match kind {
                CheckKind::UrgentMapping => {
                    reports.push(self.correlator.check_urgent_mapping(messages, cards))
                }
                CheckKind::MergedDescriptions => {
                    reports.push(self.correlator.check_merged_descriptions(messages, cards))
                }
                CheckKind::LabelledCards => {
                    reports.push(self.correlator.check_labelled_cards_present(cards))
                }
                CheckKind::ExpectedCard if self.expectations.is_empty() => {
                    tracing::info!("No expected cards configured");
                    reports.push(CheckReport::new(CheckKind::ExpectedCard));
                }
                CheckKind::ExpectedCard => reports.extend(
                    self.expectations
                        .iter()
                        .map(|expectation| check_expected_card(expectation, cards)),
                ),
            }
        }

        reports
    }
}

fn log_report(report: &CheckReport) {
    match report.verdict() {
        Verdict::Passed => tracing::info!(
            "{}: passed ({} candidates)",
            report.kind.as_str(),
            report.candidates
        ),
        Verdict::Skipped => tracing::info!("{}: skipped, nothing to check", report.kind.as_str()),
        Verdict::Failed => {
            for violation in &report.violations {
                tracing::warn!("{}: {}", report.kind.as_str(), violation);
            }
        }
    }
}

/// Worst verdict across reports: any failure fails, all-skipped skips
pub fn overall_verdict(reports: &[CheckReport]) -> Verdict {
    let verdicts: Vec<Verdict> = reports.iter().map(CheckReport::verdict).collect();
    if verdicts.contains(&Verdict::Failed) {
        Verdict::Failed
    } else if verdicts.contains(&Verdict::Passed) {
        Verdict::Passed
    } else {
        Verdict::Skipped
    }
}
