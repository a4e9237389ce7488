/// Unsplash photo search
///
/// One landscape photo per query, used to illustrate suggested dishes.
/// A missing access key disables the integration: lookups resolve to no
/// result without touching the network.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::ImageSearcher,
};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

pub struct UnsplashClient {
    http_client: HttpClient,
    api_url: String,
    access_key: String,
}

impl UnsplashClient {
    pub fn new(api_url: String, access_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            access_key,
        }
    }
}

#[async_trait::async_trait]
impl ImageSearcher for UnsplashClient {
    async fn search_first(&self, query: &str) -> AppResult<Option<String>> {
        if self.access_key.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/search/photos", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("page", "1"),
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("content_filter", "high"),
                ("client_id", self.access_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Unsplash API returned status {}",
                status
            )));
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.results.into_iter().next().map(|p| p.urls.regular))
    }
}
