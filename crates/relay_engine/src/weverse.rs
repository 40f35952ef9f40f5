use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_core::{LoginEvent, LoginFlow, WaitVerdict};
use relay_logging::{relay_info, relay_warn};
use scraper::{Html, Selector};
use url::Url;

use crate::config::LoginCredentials;
use crate::download::Downloader;
use crate::fetch::{staged_name, MediaFetcher, ScrapeError};
use crate::session::PageSession;
use crate::session_store::SessionStore;
use crate::types::StagedFile;

#[derive(Debug, Clone)]
pub struct WeverseSettings {
    /// Credential form endpoint.
    pub login_form_url: String,
    /// Class substring of post image `<img>` elements.
    pub image_class_marker: String,
    /// Case-insensitive button text marking a logged-out page.
    pub login_button_marker: String,
    /// Referer required by the image CDN.
    pub referer: String,
    /// Total budget for manual login completion.
    pub login_budget: Duration,
    pub poll_interval: Duration,
}

impl Default for WeverseSettings {
    fn default() -> Self {
        Self {
            login_form_url:
                "https://account.weverse.io/en/login/redirect?client_id=weverse&redirectMethod=GET"
                    .to_string(),
            image_class_marker: "DescriptionView_image".to_string(),
            login_button_marker: "login".to_string(),
            referer: "https://weverse.io/".to_string(),
            login_budget: Duration::from_secs(300),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Scrapes post images from a fan-community page behind a login wall.
///
/// Login may require manual completion (captcha, 2FA); the fetcher submits
/// credentials, then polls the page under a bounded budget until the login
/// marker disappears. A successful session is persisted and restored on
/// later runs so the login step is usually skipped.
pub struct WeverseFetcher {
    session: Arc<dyn PageSession>,
    downloader: Arc<Downloader>,
    store: SessionStore,
    credentials: Option<LoginCredentials>,
    settings: WeverseSettings,
}

impl WeverseFetcher {
    pub fn new(
        session: Arc<dyn PageSession>,
        downloader: Arc<Downloader>,
        store: SessionStore,
        credentials: Option<LoginCredentials>,
        settings: WeverseSettings,
    ) -> Self {
        Self {
            session,
            downloader,
            store,
            credentials,
            settings,
        }
    }

    async fn ensure_logged_in(&self, source_url: &Url) -> Result<String, ScrapeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ScrapeError::MissingCredentials)?;

        if let Some(state) = self.store.load(self.name()) {
            self.session.restore_auth_state(&state);
        }

        let snapshot = self.session.open(source_url.as_str()).await?;
        let mut flow = LoginFlow::new(self.settings.login_budget);
        let logged_in = !has_login_marker(&snapshot.html, &self.settings.login_button_marker);
        if flow.observe(LoginEvent::PageReady { logged_in }) == WaitVerdict::LoggedIn {
            relay_info!("already logged in, proceeding");
            return Ok(snapshot.html);
        }

        relay_info!("not logged in, submitting credentials");
        self.session
            .submit_login(&self.settings.login_form_url, credentials)
            .await?;
        flow.observe(LoginEvent::CredentialsSubmitted);
        relay_info!(
            "waiting up to {:?} for login completion",
            self.settings.login_budget
        );

        let started = Instant::now();
        let html = loop {
            tokio::time::sleep(self.settings.poll_interval).await;
            let probe = self.session.open(source_url.as_str()).await?;
            let logged_in = !has_login_marker(&probe.html, &self.settings.login_button_marker);
            match flow.observe(LoginEvent::Poll {
                elapsed: started.elapsed(),
                logged_in,
            }) {
                WaitVerdict::LoggedIn => break probe.html,
                WaitVerdict::TimedOut => {
                    return Err(ScrapeError::LoginTimeout(self.settings.login_budget))
                }
                WaitVerdict::Cancelled => return Err(ScrapeError::LoginCancelled),
                WaitVerdict::Pending => {}
            }
        };
        relay_info!("login successful");

        match self.session.export_auth_state() {
            Some(state) => {
                if let Err(err) = self.store.save(self.name(), &state) {
                    relay_warn!("could not persist session state: {err}");
                }
            }
            None => relay_warn!("session produced no auth state to persist"),
        }
        Ok(html)
    }
}

#[async_trait::async_trait]
impl MediaFetcher for WeverseFetcher {
    fn name(&self) -> &'static str {
        "weverse"
    }

    fn handles(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host == "weverse.io" || host.ends_with(".weverse.io"))
    }

    async fn fetch_all(
        &self,
        source_url: &Url,
        staging_dir: &Path,
    ) -> Result<Vec<StagedFile>, ScrapeError> {
        let html = self.ensure_logged_in(source_url).await?;
        let image_urls = extract_post_images(&html, &self.settings.image_class_marker);
        if image_urls.is_empty() {
            relay_info!("no images found in {source_url}");
            return Ok(Vec::new());
        }

        relay_info!("found {} images in {source_url}", image_urls.len());
        let mut staged = Vec::new();
        for (index, image_url) in image_urls.iter().enumerate() {
            let ext = url_extension(image_url).unwrap_or_else(|| ".jpg".to_string());
            let dest = staging_dir.join(staged_name(self.name(), index + 1, &ext));
            match self
                .downloader
                .fetch_to_file(image_url, &dest, Some(&self.settings.referer))
                .await
            {
                Ok(bytes) => {
                    relay_info!("downloaded image {} ({bytes} bytes)", index + 1);
                    if let Some(file) = StagedFile::from_path(&dest) {
                        staged.push(file);
                    } else {
                        // Unpublishable extension, left for the normalizer.
                        relay_info!("staged {:?} for conversion", dest.file_name());
                    }
                }
                Err(err) => relay_warn!("skipping image {} of {source_url}: {err}", index + 1),
            }
        }
        Ok(staged)
    }
}

/// A page is considered logged out when any button carries the marker text.
fn has_login_marker(html: &str, marker: &str) -> bool {
    let doc = Html::parse_document(html);
    let Ok(button_selector) = Selector::parse("button") else {
        return false;
    };
    let marker = marker.to_ascii_lowercase();
    doc.select(&button_selector).any(|button| {
        button
            .text()
            .collect::<String>()
            .to_ascii_lowercase()
            .contains(&marker)
    })
}

/// Post image URLs with query strings stripped (the full-resolution form).
fn extract_post_images(html: &str, class_marker: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector_source = format!("img[class*=\"{class_marker}\"]");
    let Ok(image_selector) = Selector::parse(&selector_source) else {
        return Vec::new();
    };
    doc.select(&image_selector)
        .filter_map(|img| img.value().attr("src"))
        .map(|src| src.split('?').next().unwrap_or(src).to_string())
        .collect()
}

/// Extension (with leading dot) from a media URL path, if it looks sane.
fn url_extension(media_url: &str) -> Option<String> {
    let parsed = Url::parse(media_url).ok()?;
    let ext = parsed.path().rsplit_once('.')?.1.to_string();
    if ext.is_empty() || ext.len() > 4 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{ext}"))
}

#[cfg(test)]
mod tests {
    use super::{extract_post_images, has_login_marker, url_extension};

    #[test]
    fn login_marker_matches_button_text_case_insensitively() {
        let html = r#"<html><body><button><span>LOGIN</span></button></body></html>"#;
        assert!(has_login_marker(html, "login"));

        let html = r#"<html><body><button>Share</button></body></html>"#;
        assert!(!has_login_marker(html, "login"));
    }

    #[test]
    fn post_images_are_selected_by_class_and_stripped_of_queries() {
        let html = r#"
            <html><body>
              <img class="DescriptionView_image_a1" src="https://cdn.example.com/a.png?type=w800">
              <img class="Header_logo" src="https://cdn.example.com/logo.png">
              <img class="x DescriptionView_image_b2" src="https://cdn.example.com/b.webp?type=s100">
            </body></html>"#;
        let urls = extract_post_images(html, "DescriptionView_image");
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/a.png",
                "https://cdn.example.com/b.webp",
            ]
        );
    }

    #[test]
    fn url_extension_falls_back_on_odd_paths() {
        assert_eq!(
            url_extension("https://cdn.example.com/a.png"),
            Some(".png".to_string())
        );
        assert_eq!(url_extension("https://cdn.example.com/noext"), None);
        assert_eq!(url_extension("https://cdn.example.com/a.verylongext"), None);
    }
}
