//! Where the bot's files come from.
//!
//! A `DataSource` answers "give me the text at this relative path". Not
//! finding a resource is a normal answer (`Ok(None)`), distinct from a
//! transport failure (`Err`). No retries are attempted.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::logging::{log_fetch_miss, Domain};
use crate::settings::Settings;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Text at `path`, or `None` if it does not exist.
    async fn fetch_text(&self, path: &str) -> Result<Option<String>>;

    fn describe(&self) -> String;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>> {
        (**self).fetch_text(path).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Reads below a local directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>> {
        let full = self.root.join(path);
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log_fetch_miss(Domain::Source, path);
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("reading {}", full.display())),
        }
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

/// GETs below a base URL, e.g. the directory a static file server exposes.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        // A base without a trailing slash would lose its last segment on join.
        let base = if base.ends_with('/') {
            Url::parse(base)
        } else {
            Url::parse(&format!("{}/", base))
        }
        .with_context(|| format!("invalid base url {}", base))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, base })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("joining {} onto {}", path, self.base))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            log_fetch_miss(Domain::Source, path);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("GET {} returned {}", url, status));
        }
        let body = resp.text().await.with_context(|| format!("body of {}", url))?;
        Ok(Some(body))
    }

    fn describe(&self) -> String {
        format!("http:{}", self.base)
    }
}

/// Relative locations of the bot's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub config: String,
    pub log_dir: String,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self {
            config: "config/trading_config.py".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl ResourcePaths {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            config: settings.config_path.clone(),
            log_dir: settings.log_dir.trim_end_matches('/').to_string(),
        }
    }

    pub fn trading_log(&self, date: NaiveDate) -> String {
        format!("{}/trading_log_{}.json", self.log_dir, file_stamp(date))
    }

    pub fn trade_history(&self, date: NaiveDate) -> String {
        format!("{}/trade_history_{}.json", self.log_dir, file_stamp(date))
    }

    pub fn trade_log(&self) -> String {
        format!("{}/trade.log", self.log_dir)
    }
}

/// `YYYYMMDD`
pub fn file_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Pick the source the settings ask for.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn DataSource>> {
    match &settings.base_url {
        Some(base) => Ok(Box::new(HttpSource::new(
            base,
            Duration::from_secs(settings.http_timeout_secs),
        )?)),
        None => Ok(Box::new(FsSource::new(settings.root.clone()))),
    }
}
