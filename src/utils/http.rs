// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Source of raw page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw body of `url`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Page fetcher backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a fetcher with a client configured from `config`.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(Url::parse(url)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {status}")));
        }
        Ok(response.text().await?)
    }
}

/// Strip spaces and newlines; every extraction pattern is written against this form.
pub fn normalize_markup(raw: &str) -> String {
    raw.chars().filter(|c| *c != ' ' && *c != '\n').collect()
}
