//! Trello board REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use sync_types::Card;

use super::{read_json, CardSource};
use crate::config::TrelloConfig;
use crate::error::Result;

pub struct TrelloClient {
    http: Client,
    api_base: String,
    api_key: String,
    api_token: String,
    board_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrelloCard {
    pub id: String,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub id_list: Option<String>,
    pub labels: Vec<TrelloLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrelloLabel {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrelloList {
    pub id: String,
    pub name: String,
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> Self {
        Self {
            http: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_token: config.api_token.clone(),
            board_id: config.board_id.clone(),
        }
    }

    async fn get_board<T: serde::de::DeserializeOwned>(&self, resource: &str) -> Result<T> {
        let url = format!("{}/boards/{}/{}", self.api_base, self.board_id, resource);
        let response = self
            .http
            .get(url)
            .query(&[("key", &self.api_key), ("token", &self.api_token)])
            .send()
            .await?;

        read_json("Trello", response).await
    }

    pub async fn get_cards(&self) -> Result<Vec<TrelloCard>> {
        self.get_board("cards").await
    }

    pub async fn get_lists(&self) -> Result<Vec<TrelloList>> {
        self.get_board("lists").await
    }
}

/// Convert API cards, resolving each card's list id to the list name
pub fn to_cards(cards: Vec<TrelloCard>, lists: &[TrelloList]) -> Vec<Card> {
    let list_names: HashMap<&str, &str> = lists
        .iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect();

    cards
        .into_iter()
        .map(|c| Card {
            status: c
                .id_list
                .as_deref()
                .and_then(|id| list_names.get(id))
                .map(|name| name.to_string()),
            title: c.name.unwrap_or_default(),
            description: c.desc.unwrap_or_default(),
            labels: c
                .labels
                .into_iter()
                .filter_map(|l| l.name)
                .filter(|name| !name.is_empty())
                .collect(),
        })
        .collect()
}

#[async_trait]
impl CardSource for TrelloClient {
    async fn fetch_cards(&self) -> Result<Vec<Card>> {
        let cards = self.get_cards().await?;
        let lists = self.get_lists().await?;
        tracing::info!(
            "Fetched {} cards in {} lists from board {}",
            cards.len(),
            lists.len(),
            self.board_id
        );
        Ok(to_cards(cards, &lists))
    }
}
