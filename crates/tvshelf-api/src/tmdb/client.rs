use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::TmdbError;
use super::types::{RawSeason, RawShowDetail, SearchResponse, TmdbStatus};
use crate::traits::CatalogService;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// TMDB API v3 client.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            language: DEFAULT_LANGUAGE.into(),
            http: Client::new(),
        }
    }

    /// Point the client at another API root (trailing slashes are ignored).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check the HTTP response for errors, preferring TMDB's `status_message`.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            let message = serde_json::from_str::<TmdbStatus>(&body)
                .ok()
                .and_then(|s| s.status_message)
                .unwrap_or(body);
            Err(TmdbError::Api { status, message })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        if self.api_key.trim().is_empty() {
            return Err(TmdbError::Config("TMDB API key is not set".into()));
        }
        let url = self.url(path);
        tracing::debug!(%url, "TMDB request");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(extra)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))
    }
}

impl CatalogService for TmdbClient {
    type Error = TmdbError;

    async fn search_by_name(&self, query: &str) -> Result<SearchResponse, TmdbError> {
        self.get_json("search/tv", &[("query", query), ("page", "1")])
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<RawShowDetail, TmdbError> {
        self.get_json(&format!("tv/{id}"), &[]).await
    }

    async fn get_season(&self, show_id: i64, season_number: u32) -> Result<RawSeason, TmdbError> {
        self.get_json(&format!("tv/{show_id}/season/{season_number}"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = TmdbClient::new("key").with_base_url("http://localhost:8080/3/");
        assert_eq!(client.url("search/tv"), "http://localhost:8080/3/search/tv");
        assert_eq!(client.url("/tv/1668"), "http://localhost:8080/3/tv/1668");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_sending() {
        let client = TmdbClient::new("  ").with_base_url("http://127.0.0.1:9");
        let err = client.search_by_name("friends").await.unwrap_err();
        assert!(matches!(err, TmdbError::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let client = TmdbClient::new("key");
        assert_eq!(client.url("tv/1/season/2"), format!("{DEFAULT_BASE_URL}/tv/1/season/2"));
        assert_eq!(client.language, DEFAULT_LANGUAGE);
    }
}
