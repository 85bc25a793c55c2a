//! Card collection by scraping the board in a real browser.
//!
//! Opens each card's modal in turn to read the title, labels and description
//! exactly as a user would see them.

use async_trait::async_trait;
use std::collections::BTreeSet;
use sync_types::Card;

use super::webdriver::{By, Element, Session};
use super::CardSource;
use crate::config::UiConfig;
use crate::error::Result;

const CARD_NAME: &str = "card-name";
const TITLE_INPUT: &str = "card-back-title-input";
const CARD_LABEL: &str = "card-label";
const DESCRIPTION_EDIT: &str = "description-edit-button";
const DESCRIPTION_EDITOR: &str = "editor-content-container";

/// Closest ancestor that contains a list header, then that header
const LIST_NAME_XPATH: &str =
    "./ancestor::*[.//*[@data-testid='list-name']][1]//*[@data-testid='list-name']";

pub struct BoardUi {
    config: UiConfig,
}

impl BoardUi {
    pub fn new(config: UiConfig) -> Self {
        Self { config }
    }
}

fn dialog() -> By {
    By::css("[role='dialog']")
}

fn close_button() -> By {
    By::css("button[aria-label='Close dialog']")
}

#[async_trait]
impl CardSource for BoardUi {
    async fn fetch_cards(&self) -> Result<Vec<Card>> {
        let session = Session::start(&self.config).await?;
        let result = scrape_board(&session, &self.config.board_url).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close WebDriver session: {}", e);
        }

        result
    }
}

async fn scrape_board(session: &Session, board_url: &str) -> Result<Vec<Card>> {
    session.goto(board_url).await?;
    session.wait_visible(&By::test_id(CARD_NAME)).await?;

    let count = session.find_all(&By::test_id(CARD_NAME)).await?.len();
    tracing::info!("Board shows {} cards", count);

    let mut cards = Vec::with_capacity(count);
    for i in 0..count {
        // re-query every time: closing the modal re-renders the board
        let names = session.find_all(&By::test_id(CARD_NAME)).await?;
        let Some(card_name) = names.get(i) else {
            tracing::warn!("Card {} disappeared while scraping", i);
            break;
        };
        cards.push(read_card(session, card_name).await?);
    }

    Ok(cards)
}

async fn read_card(session: &Session, card_name: &Element) -> Result<Card> {
    let status = match session
        .find_all_in(card_name, &By::xpath(LIST_NAME_XPATH))
        .await?
        .first()
    {
        Some(list_name) => Some(session.text(list_name).await?.trim().to_string()),
        None => None,
    };

    session.click(card_name).await?;
    let modal = session.wait_visible(&dialog()).await?;

    let title_input = session.wait_visible(&By::test_id(TITLE_INPUT)).await?;
    let title = session
        .property(&title_input, "value")
        .await?
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut labels = BTreeSet::new();
    for label in session.find_all_in(&modal, &By::test_id(CARD_LABEL)).await? {
        let text = session.text(&label).await?.trim().to_string();
        if !text.is_empty() {
            labels.insert(text);
        }
    }

    let description = read_description(session).await?;

    tracing::debug!("Card '{}' labels={:?} status={:?}", title, labels, status);

    if let Some(close) = session.find_all(&close_button()).await?.first() {
        session.click(close).await?;
    }
    session.wait_hidden(&dialog()).await?;

    Ok(Card {
        title,
        description,
        labels,
        status,
    })
}

/// Cards without a description may not offer the edit button
async fn read_description(session: &Session) -> Result<String> {
    let Some(edit) = session
        .find_all(&By::test_id(DESCRIPTION_EDIT))
        .await?
        .into_iter()
        .next()
    else {
        return Ok(String::new());
    };

    session.click(&edit).await?;
    let editor = session.wait_visible(&By::test_id(DESCRIPTION_EDITOR)).await?;
    Ok(session.text(&editor).await?.trim().to_string())
}
