use std::path::Path;
use std::sync::Arc;

use relay_logging::{relay_info, relay_warn};
use scraper::{Html, Selector};
use url::Url;

use crate::download::Downloader;
use crate::fetch::{staged_name, MediaFetcher, ScrapeError};
use crate::session::PageSession;
use crate::types::StagedFile;

#[derive(Debug, Clone)]
pub struct TwitterSettings {
    /// Substring identifying tweet media `<img>` sources.
    pub media_url_marker: String,
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            media_url_marker: "pbs.twimg.com/media".to_string(),
        }
    }
}

/// Scrapes still images out of a tweet page.
pub struct TwitterFetcher {
    session: Arc<dyn PageSession>,
    downloader: Arc<Downloader>,
    settings: TwitterSettings,
}

impl TwitterFetcher {
    pub fn new(
        session: Arc<dyn PageSession>,
        downloader: Arc<Downloader>,
        settings: TwitterSettings,
    ) -> Self {
        Self {
            session,
            downloader,
            settings,
        }
    }
}

#[async_trait::async_trait]
impl MediaFetcher for TwitterFetcher {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn handles(&self, url: &Url) -> bool {
        matches!(
            url.host_str(),
            Some("twitter.com") | Some("www.twitter.com") | Some("x.com") | Some("www.x.com")
        )
    }

    async fn fetch_all(
        &self,
        source_url: &Url,
        staging_dir: &Path,
    ) -> Result<Vec<StagedFile>, ScrapeError> {
        let snapshot = self.session.open(source_url.as_str()).await?;
        let media_urls = extract_media_urls(&snapshot.html, &self.settings.media_url_marker);
        if media_urls.is_empty() {
            relay_info!("no media found in {source_url}");
            return Ok(Vec::new());
        }

        relay_info!("found {} media urls in {source_url}", media_urls.len());
        let mut staged = Vec::new();
        for (index, media_url) in media_urls.iter().enumerate() {
            // Tweet stills are served as JPEG whatever the size variant.
            let dest = staging_dir.join(staged_name(self.name(), index, ".jpg"));
            match self.downloader.fetch_to_file(media_url, &dest, None).await {
                Ok(bytes) => {
                    relay_info!("downloaded media {index} ({bytes} bytes)");
                    if let Some(file) = StagedFile::from_path(&dest) {
                        staged.push(file);
                    }
                }
                Err(err) => relay_warn!("skipping media {index} of {source_url}: {err}"),
            }
        }
        Ok(staged)
    }
}

/// Collect media image URLs, upgraded to the original-resolution variant.
fn extract_media_urls(html: &str, marker: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(img_selector) = Selector::parse("img") else {
        return Vec::new();
    };
    doc.select(&img_selector)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.contains(marker))
        .map(upgrade_to_original)
        .collect()
}

/// Rewrite the `name` size parameter to `orig`, keeping other parameters.
fn upgrade_to_original(src: &str) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !pairs.iter().any(|(k, _)| k == "name") {
        return src.to_string();
    }
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            if k == "name" {
                query.append_pair(k, "orig");
            } else {
                query.append_pair(k, v);
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::{extract_media_urls, upgrade_to_original};

    const MARKER: &str = "pbs.twimg.com/media";

    #[test]
    fn picks_only_media_images() {
        let html = r#"
            <html><body>
              <img src="https://pbs.twimg.com/media/abc?format=jpg&name=small">
              <img src="https://pbs.twimg.com/profile_images/avatar.jpg">
              <img src="https://pbs.twimg.com/media/def?format=jpg&name=900x900">
            </body></html>"#;
        let urls = extract_media_urls(html, MARKER);
        assert_eq!(
            urls,
            vec![
                "https://pbs.twimg.com/media/abc?format=jpg&name=orig",
                "https://pbs.twimg.com/media/def?format=jpg&name=orig",
            ]
        );
    }

    #[test]
    fn upgrade_replaces_only_the_name_parameter() {
        assert_eq!(
            upgrade_to_original("https://pbs.twimg.com/media/abc?format=png&name=small"),
            "https://pbs.twimg.com/media/abc?format=png&name=orig"
        );
    }

    #[test]
    fn upgrade_leaves_urls_without_a_size_parameter_alone() {
        assert_eq!(
            upgrade_to_original("https://pbs.twimg.com/media/abc?format=png"),
            "https://pbs.twimg.com/media/abc?format=png"
        );
        assert_eq!(
            upgrade_to_original("not a url"),
            "not a url"
        );
    }

    #[test]
    fn empty_page_yields_no_urls() {
        assert!(extract_media_urls("<html></html>", MARKER).is_empty());
    }
}
