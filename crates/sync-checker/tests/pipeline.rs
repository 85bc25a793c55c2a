//! Extraction through correlation, starting from service JSON.

use sync_checker::sources::trello::{to_cards, TrelloCard, TrelloList};
use sync_checker::{extract_message, Correlator, SystemKeywords};
use sync_types::{Message, RawMessage, Verdict, Violation};

const GMAIL_MESSAGES: &str = r#"[
  {
    "id": "m1",
    "threadId": "t1",
    "payload": {
      "mimeType": "multipart/alternative",
      "headers": [
        {"name": "Subject", "value": "Task: summarize the meeting"},
        {"name": "Date", "value": "Mon, 3 Nov 2025 09:15:00 +0000"}
      ],
      "body": {"size": 0},
      "parts": [
        {"partId": "0", "mimeType": "text/plain; charset=\"UTF-8\"", "body": {"size": 26, "data": "Rm9yIGFsbCBvZiB1cyBQbGVhc2UgZG8gc28NCg"}},
        {"partId": "1", "mimeType": "text/html; charset=\"UTF-8\"", "body": {"size": 40, "data": "PGRpdj5Gb3IgYWxsIG9mIHVzPC9kaXY-"}}
      ]
    }
  },
  {
    "id": "m2",
    "threadId": "t2",
    "payload": {
      "mimeType": "multipart/mixed",
      "headers": [{"name": "subject", "value": "Task: summarize the meeting"}],
      "parts": [
        {
          "partId": "0",
          "mimeType": "multipart/alternative",
          "parts": [
            {"partId": "0.0", "mimeType": "text/plain", "body": {"data": "VXJnZW50OiBzZW5kIG5vdGVz"}}
          ]
        },
        {"partId": "1", "mimeType": "application/pdf", "filename": "notes.pdf", "body": {"attachmentId": "a1", "size": 1024}}
      ]
    }
  },
  {
    "id": "m3",
    "threadId": "t3",
    "payload": {
      "mimeType": "text/plain",
      "headers": [{"name": "Subject", "value": "Google Account: verification code"}],
      "body": {"size": 17, "data": "dXJnZW50IGNvZGUgMTIzNDU2"}
    }
  },
  {
    "id": "m4",
    "threadId": "t4",
    "payload": {
      "mimeType": "multipart/mixed",
      "headers": [],
      "parts": [{"partId": "0", "mimeType": "image/png", "body": {"attachmentId": "a2", "size": 10}}]
    }
  }
]"#;

const TRELLO_CARDS: &str = r#"[
  {
    "id": "c1",
    "name": "summarize the meeting",
    "desc": "For all of us Please do so\n\nUrgent: send notes",
    "idList": "l1",
    "labels": [{"id": "x1", "name": "Urgent", "color": "red"}, {"id": "x2", "name": "New", "color": "green"}]
  },
  {"id": "c2", "name": "Unrelated", "desc": "", "idList": "l2", "labels": []}
]"#;

const TRELLO_LISTS: &str = r#"[{"id": "l1", "name": "To Do"}, {"id": "l2", "name": "Done"}]"#;

fn messages() -> Vec<Message> {
    let raw: Vec<RawMessage> = serde_json::from_str(GMAIL_MESSAGES).unwrap();
    let keywords = SystemKeywords::default();
    raw.iter().map(|m| extract_message(m, &keywords)).collect()
}

fn cards() -> Vec<sync_types::Card> {
    let cards: Vec<TrelloCard> = serde_json::from_str(TRELLO_CARDS).unwrap();
    let lists: Vec<TrelloList> = serde_json::from_str(TRELLO_LISTS).unwrap();
    to_cards(cards, &lists)
}

#[test]
fn test_extraction_from_gmail_json() {
    let messages = messages();

    assert_eq!(messages[0].body, "For all of us Please do so\r\n");
    assert!(messages[0].received_at.is_some());
    assert_eq!(messages[1].subject, "Task: summarize the meeting");
    assert_eq!(messages[1].body, "Urgent: send notes");
    assert!(messages[2].is_system_notification);
    assert_eq!(messages[3].subject, "");
    assert_eq!(messages[3].body, "");
}

#[test]
fn test_synced_board_passes() {
    let correlator = Correlator::default();
    let messages = messages();
    let cards = cards();

    let urgent = correlator.check_urgent_mapping(&messages, &cards);
    assert_eq!(urgent.candidates, 1);
    assert_eq!(urgent.verdict(), Verdict::Passed);

    let merged = correlator.check_merged_descriptions(&messages, &cards);
    assert_eq!(merged.candidates, 1);
    assert_eq!(merged.verdict(), Verdict::Passed);
}

#[test]
fn test_unsynced_board_fails() {
    let correlator = Correlator::default();
    let messages = messages();
    let mut cards = cards();
    cards[0].labels.remove("Urgent");
    cards[0].description = "For all of us Please do so".to_string();

    let urgent = correlator.check_urgent_mapping(&messages, &cards);
    assert_eq!(
        urgent.violations,
        vec![Violation::MissingLabel {
            card_title: "summarize the meeting".to_string(),
            subject: Some("Task: summarize the meeting".to_string()),
            label: "Urgent".to_string(),
        }]
    );

    let merged = correlator.check_merged_descriptions(&messages, &cards);
    assert_eq!(
        merged.violations,
        vec![Violation::MissingBody {
            subject: "Task: summarize the meeting".to_string(),
            card_title: "summarize the meeting".to_string(),
            body: "Urgent: send notes".to_string(),
        }]
    );
}

#[test]
fn test_card_status_from_lists() {
    let cards = cards();
    assert_eq!(cards[0].status.as_deref(), Some("To Do"));
    assert_eq!(cards[1].status.as_deref(), Some("Done"));
}
