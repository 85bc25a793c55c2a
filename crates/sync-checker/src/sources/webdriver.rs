//! Minimal W3C WebDriver client over HTTP.
//!
//! Covers what board scraping needs: sessions, navigation, element lookup,
//! clicks, text/property reads and visibility waits.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::config::UiConfig;
use crate::error::{CheckError, Result};

/// W3C web element identifier key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Element locator strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    Css(String),
    XPath(String),
}

impl By {
    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        By::XPath(expr.into())
    }

    /// `[data-testid='…']`
    pub fn test_id(id: &str) -> Self {
        By::Css(format!("[data-testid='{}']", id))
    }

    fn to_json(&self) -> Value {
        match self {
            By::Css(s) => json!({ "using": "css selector", "value": s }),
            By::XPath(s) => json!({ "using": "xpath", "value": s }),
        }
    }

    fn describe(&self) -> String {
        match self {
            By::Css(s) => format!("css {}", s),
            By::XPath(s) => format!("xpath {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element(String);

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireError {
    error: String,
    message: String,
}

/// An open browser session
pub struct Session {
    http: Client,
    url: String,
    timeout: Duration,
}

impl Session {
    /// Start a new browser session on the configured WebDriver server
    pub async fn start(config: &UiConfig) -> Result<Self> {
        let http = Client::new();
        let base = config.webdriver_url.trim_end_matches('/').to_string();

        let value = send(
            http.post(format!("{}/session", base))
                .json(&capabilities(&config.browser, config.headless)),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| CheckError::WebDriver {
                error: "session not created".to_string(),
                message: format!("no sessionId in {}", value),
            })?;

        tracing::debug!("Started {} WebDriver session {}", config.browser, session_id);

        Ok(Self {
            url: format!("{}/session/{}", base, session_id),
            http,
            timeout: Duration::from_secs(config.wait_timeout_secs),
        })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.post("url", json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn find_all(&self, by: &By) -> Result<Vec<Element>> {
        let value = self.post("elements", by.to_json()).await?;
        Ok(parse_elements(&value))
    }

    /// Search below `parent`
    pub async fn find_all_in(&self, parent: &Element, by: &By) -> Result<Vec<Element>> {
        let value = self
            .post(&format!("element/{}/elements", parent.0), by.to_json())
            .await?;
        Ok(parse_elements(&value))
    }

    pub async fn click(&self, element: &Element) -> Result<()> {
        self.post(&format!("element/{}/click", element.0), json!({}))
            .await?;
        Ok(())
    }

    pub async fn text(&self, element: &Element) -> Result<String> {
        let value = self.get(&format!("element/{}/text", element.0)).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn property(&self, element: &Element, name: &str) -> Result<Option<String>> {
        let value = self
            .get(&format!("element/{}/property/{}", element.0, name))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    pub async fn is_displayed(&self, element: &Element) -> Result<bool> {
        let value = self
            .get(&format!("element/{}/displayed", element.0))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Block until an element matching `by` is displayed
    pub async fn wait_visible(&self, by: &By) -> Result<Element> {
        let deadline = Instant::now() + self.timeout;
        loop {
            for element in self.find_all(by).await? {
                // elements can go stale while the page re-renders
                if self.is_displayed(&element).await.unwrap_or(false) {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(format!("{} to be visible", by.describe())));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Block until no element matching `by` is displayed
    pub async fn wait_hidden(&self, by: &By) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let mut visible = false;
            for element in self.find_all(by).await? {
                if self.is_displayed(&element).await.unwrap_or(false) {
                    visible = true;
                    break;
                }
            }
            if !visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(format!("{} to disappear", by.describe())));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn close(self) -> Result<()> {
        send(self.http.delete(&self.url)).await?;
        Ok(())
    }

    fn timed_out(&self, what: String) -> CheckError {
        CheckError::ElementTimeout {
            what,
            secs: self.timeout.as_secs(),
        }
    }

    async fn post(&self, command: &str, body: Value) -> Result<Value> {
        send(self.http.post(format!("{}/{}", self.url, command)).json(&body)).await
    }

    async fn get(&self, command: &str) -> Result<Value> {
        send(self.http.get(format!("{}/{}", self.url, command))).await
    }
}

async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let envelope: Envelope = response.json().await?;

    if status.is_success() {
        Ok(envelope.value)
    } else {
        Err(wire_error(envelope.value))
    }
}

fn wire_error(value: Value) -> CheckError {
    let err: WireError = serde_json::from_value(value).unwrap_or_default();
    CheckError::WebDriver {
        error: err.error,
        message: err.message,
    }
}

fn parse_elements(value: &Value) -> Vec<Element> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
                .map(|id| Element(id.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn capabilities(browser: &str, headless: bool) -> Value {
    let always_match = match browser {
        "firefox" => {
            let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
            json!({ "browserName": "firefox", "moz:firefoxOptions": { "args": args } })
        }
        other => {
            let args: Vec<&str> = if headless { vec!["--headless=new"] } else { vec![] };
            json!({ "browserName": other, "goog:chromeOptions": { "args": args } })
        }
    };
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements() {
        let value = json!([
            { ELEMENT_KEY: "e1" },
            { "unexpected": "x" },
            { ELEMENT_KEY: "e2" }
        ]);
        assert_eq!(
            parse_elements(&value),
            vec![Element("e1".to_string()), Element("e2".to_string())]
        );
        assert!(parse_elements(&Value::Null).is_empty());
    }

    #[test]
    fn test_wire_error() {
        let err = wire_error(json!({
            "error": "no such element",
            "message": "Unable to locate element",
            "stacktrace": ""
        }));
        assert!(matches!(
            err,
            CheckError::WebDriver { ref error, .. } if error == "no such element"
        ));
    }

    #[test]
    fn test_capabilities() {
        let caps = capabilities("chrome", true);
        assert_eq!(
            caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"],
            json!(["--headless=new"])
        );

        let caps = capabilities("firefox", false);
        assert_eq!(caps["capabilities"]["alwaysMatch"]["browserName"], "firefox");
        assert_eq!(
            caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"],
            json!([])
        );
    }

    #[test]
    fn test_locators() {
        assert_eq!(
            By::test_id("card-name").to_json(),
            json!({ "using": "css selector", "value": "[data-testid='card-name']" })
        );
        assert_eq!(By::xpath("./..").to_json()["using"], "xpath");
    }
}
