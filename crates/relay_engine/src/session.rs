use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE, USER_AGENT};
use serde_json::{json, Value};

use crate::config::LoginCredentials;
use crate::decode::decode_page;
use crate::download::BROWSER_USER_AGENT;
use crate::fetch::ScrapeError;

/// A resolved page: decoded HTML plus the URL it settled on after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub html: String,
    pub final_url: String,
}

/// Narrow capability over page scraping. Fetchers talk to pages only
/// through this trait, so site scraping internals (and their tests) stay
/// behind one seam.
#[async_trait::async_trait]
pub trait PageSession: Send + Sync {
    /// Resolve a page and return its decoded HTML.
    async fn open(&self, url: &str) -> Result<PageSnapshot, ScrapeError>;

    /// Submit a credential form to the given endpoint.
    async fn submit_login(
        &self,
        form_url: &str,
        credentials: &LoginCredentials,
    ) -> Result<(), ScrapeError>;

    /// Opaque session state to persist across runs, if any was established.
    fn export_auth_state(&self) -> Option<Value>;

    /// Restore session state exported by an earlier run.
    fn restore_auth_state(&self, state: &Value);
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Plain-HTTP page session. Cookies granted on login are kept in memory
/// and replayed on every subsequent request; the cookie string doubles as
/// the exported auth state.
pub struct HttpPageSession {
    client: reqwest::Client,
    cookies: Mutex<Option<String>>,
}

impl HttpPageSession {
    pub fn new(settings: SessionSettings) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ScrapeError::Navigation(err.to_string()))?;
        Ok(Self {
            client,
            cookies: Mutex::new(None),
        })
    }

    fn current_cookies(&self) -> Option<String> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn store_cookies(&self, cookies: Option<String>) {
        *self.cookies.lock().unwrap_or_else(|e| e.into_inner()) = cookies;
    }
}

#[async_trait::async_trait]
impl PageSession for HttpPageSession {
    async fn open(&self, url: &str) -> Result<PageSnapshot, ScrapeError> {
        let mut request = self.client.get(url).header(USER_AGENT, BROWSER_USER_AGENT);
        if let Some(cookies) = self.current_cookies() {
            request = request.header(COOKIE, cookies);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ScrapeError::Navigation(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ScrapeError::Navigation(err.to_string()))?;

        let page = decode_page(&bytes, content_type.as_deref())?;
        Ok(PageSnapshot {
            html: page.html,
            final_url,
        })
    }

    async fn submit_login(
        &self,
        form_url: &str,
        credentials: &LoginCredentials,
    ) -> Result<(), ScrapeError> {
        let response = self
            .client
            .post(form_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .form(&[
                ("email", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|err| ScrapeError::Navigation(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus(status.as_u16()));
        }

        let granted: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            // Keep only the name=value pair, drop cookie attributes.
            .filter_map(|cookie| cookie.split(';').next())
            .map(|pair| pair.trim().to_string())
            .collect();
        if !granted.is_empty() {
            self.store_cookies(Some(granted.join("; ")));
        }
        Ok(())
    }

    fn export_auth_state(&self) -> Option<Value> {
        self.current_cookies().map(|cookies| json!({ "cookies": cookies }))
    }

    fn restore_auth_state(&self, state: &Value) {
        let cookies = state
            .get("cookies")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string());
        if cookies.is_some() {
            self.store_cookies(cookies);
        }
    }
}
