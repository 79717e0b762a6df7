use remap_search::url::last_path_component;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SourceError};

pub const DEFAULT_FETCH_ATTEMPTS: u32 = 10;
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
const BACKOFF_BASE: f64 = 1.5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads sitemap documents into a local directory.
pub struct SitemapFetcher {
    client: Client,
    attempts: u32,
    max_backoff: Duration,
}

impl SitemapFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("url-remap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            attempts: DEFAULT_FETCH_ATTEMPTS,
            max_backoff: DEFAULT_MAX_BACKOFF,
        })
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Saves `url` under `out_dir`, retrying with capped exponential backoff.
    ///
    /// An existing non-empty file with the target name is reused without a
    /// request. `index` is 1-based and only names files whose URL path has
    /// no usable last component.
    pub async fn fetch(&self, url: &str, out_dir: &Path, index: usize) -> Result<PathBuf> {
        tokio::fs::create_dir_all(out_dir).await?;
        let target = out_dir.join(sitemap_file_name(url, index));

        if let Ok(meta) = tokio::fs::metadata(&target).await {
            if meta.is_file() && meta.len() > 0 {
                log::info!("Using existing {}", target.display());
                return Ok(target);
            }
        }

        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.download(url).await {
                Ok(body) => {
                    tokio::fs::write(&target, &body).await?;
                    log::info!(
                        "Saved {} ({} bytes) to {}",
                        url,
                        body.len(),
                        target.display()
                    );
                    return Ok(target);
                }
                Err(err) => {
                    log::warn!(
                        "Fetching {url} failed (attempt {attempt}/{}): {err}",
                        self.attempts
                    );
                    last_error = Some(err);
                    if attempt < self.attempts {
                        tokio::time::sleep(backoff_delay(attempt, self.max_backoff)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Other(format!("no attempt made for {url}"))))
    }

    /// Fetches every URL in order; failures are logged and left out.
    pub async fn fetch_all(&self, urls: &[String], out_dir: &Path) -> Vec<PathBuf> {
        let mut saved = Vec::with_capacity(urls.len());
        for (idx, url) in urls.iter().enumerate() {
            match self.fetch(url, out_dir, idx + 1).await {
                Ok(path) => saved.push(path),
                Err(err) => log::error!("Giving up on {url}: {err}"),
            }
        }
        saved
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Local file name for a sitemap URL: its last path component, else
/// `sitemap_{index}.xml`, always ending in `.xml`.
pub fn sitemap_file_name(url: &str, index: usize) -> String {
    let last = last_path_component(url);
    let unusable = last.is_empty() || last == "." || last == ".." || last.contains(['/', '\\']);
    let mut name = if unusable {
        format!("sitemap_{index}.xml")
    } else {
        last
    };
    if !name.to_ascii_lowercase().ends_with(".xml") {
        name.push_str(".xml");
    }
    name
}

/// Delay before retrying after failed attempt `attempt` (1-based).
pub fn backoff_delay(attempt: u32, max: Duration) -> Duration {
    let secs = BACKOFF_BASE.powi(attempt as i32);
    Duration::from_secs_f64(secs.min(max.as_secs_f64()))
}

/// `.xml` files already present in `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn existing_sitemaps(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if is_xml && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
