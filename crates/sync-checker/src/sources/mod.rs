//! Collectors for the two snapshots a reconciliation pass compares.
//!
//! The correlator does not care where cards came from: the board API and the
//! browser-driven board UI both produce the same `Card` records.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sync_types::{Card, RawMessage};

use crate::error::{CheckError, Result};

pub mod board_ui;
pub mod gmail;
pub mod trello;
pub mod webdriver;

pub use board_ui::BoardUi;
pub use gmail::GmailClient;
pub use trello::TrelloClient;

/// Read-only mailbox access
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn list_message_ids(&self) -> Result<Vec<String>>;

    async fn get_message(&self, id: &str) -> Result<RawMessage>;
}

/// Read-only board access
#[async_trait]
pub trait CardSource: Send + Sync {
    async fn fetch_cards(&self) -> Result<Vec<Card>>;
}

/// Decode a JSON response, turning non-success statuses into `CheckError::Status`
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CheckError::Status {
            service,
            status,
            body,
        });
    }
    Ok(response.json::<T>().await?)
}
