//! Gmail REST client.
//!
//! Talks to the JSON API directly so message bodies arrive as the raw
//! URL-safe base64 text the extractor expects.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use sync_types::RawMessage;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::authorized_user::AuthorizedUserSecret;

use super::{read_json, MailSource};
use crate::config::GmailConfig;
use crate::error::{CheckError, Result};

const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Largest page the list endpoint accepts
const MAX_PAGE_SIZE: u32 = 500;

pub struct GmailClient {
    http: Client,
    auth: DefaultAuthenticator,
    api_base: String,
    user_id: String,
    max_messages: u32,
}

/// Fields of an authorized-user token file. Files written by Google's client
/// libraries carry more keys (and sometimes no `type`), which are ignored.
#[derive(Debug, Deserialize)]
struct TokenFile {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListMessagesResponse {
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessageRef {
    id: String,
}

impl GmailClient {
    pub async fn from_config(config: &GmailConfig) -> Result<Self> {
        let secret = read_token_file(&config.token_file).await?;

        let auth = yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await?;

        Ok(Self {
            http: Client::new(),
            auth,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            max_messages: config.max_messages,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let token = self.auth.token(&[GMAIL_READONLY_SCOPE]).await?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| CheckError::Auth("token response without access token".to_string()))
    }

    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.api_base, self.user_id)
    }
}

async fn read_token_file(path: &Path) -> Result<AuthorizedUserSecret> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CheckError::Config(format!("cannot read token file {}: {}", path.display(), e))
    })?;
    let token: TokenFile = serde_json::from_str(&content)?;

    Ok(AuthorizedUserSecret {
        client_id: token.client_id,
        client_secret: token.client_secret,
        refresh_token: token.refresh_token,
        key_type: "authorized_user".to_string(),
    })
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_message_ids(&self) -> Result<Vec<String>> {
        let token = self.access_token().await?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while (ids.len() as u32) < self.max_messages {
            let remaining = self.max_messages - ids.len() as u32;
            let mut request = self
                .http
                .get(self.messages_url())
                .bearer_auth(&token)
                .query(&[("maxResults", remaining.min(MAX_PAGE_SIZE))]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page)]);
            }

            let page: ListMessagesResponse = read_json("Gmail", request.send().await?).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        ids.truncate(self.max_messages as usize);
        tracing::info!("Listed {} Gmail messages", ids.len());
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/{}", self.messages_url(), id))
            .bearer_auth(&token)
            .query(&[("format", "full")])
            .send()
            .await?;

        read_json("Gmail", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_without_messages() {
        let page: ListMessagesResponse = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_list_response_page() {
        let page: ListMessagesResponse = serde_json::from_str(
            r#"{"messages": [{"id": "a", "threadId": "t"}, {"id": "b", "threadId": "t"}],
                "nextPageToken": "p2"}"#,
        )
        .unwrap();
        let ids: Vec<_> = page.messages.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn test_read_token_file_accepts_google_auth_format() {
        let path = std::env::temp_dir().join(format!("sync-checker-token-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"{"token": "ya29.x", "refresh_token": "1//r", "token_uri": "https://oauth2.googleapis.com/token",
                "client_id": "cid.apps.googleusercontent.com", "client_secret": "s",
                "scopes": ["https://mail.google.com/"]}"#,
        )
        .await
        .unwrap();

        let secret = read_token_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(secret.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(secret.refresh_token, "1//r");
        assert_eq!(secret.key_type, "authorized_user");
    }

    #[tokio::test]
    async fn test_read_token_file_missing() {
        let err = read_token_file(Path::new("/nonexistent/token.json")).await.unwrap_err();
        assert!(matches!(err, CheckError::Config(_)));
    }
}
