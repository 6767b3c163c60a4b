//! HTTP client for the learning-progress service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{LaunchInfo, LearningProgress, ProgressUpdate};
use crate::catalog::{CatalogItem, LearningItem, UserContext};

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

/// REST client; forwards the caller's auth token as a bearer token
pub struct HttpProgressClient {
    client: Client,
    base_url: String,
}

impl HttpProgressClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build learning-progress HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn user_url(&self, user: &UserContext, path: &str) -> String {
        format!("{}/users/{}/learning{}", self.base_url, user.user_id, path)
    }

    fn authorize(&self, request: RequestBuilder, user: &UserContext) -> RequestBuilder {
        let request = match &user.site_id {
            Some(site) => request.header("X-Site-Id", site.as_str()),
            None => request,
        };
        let request = match &user.locale {
            Some(locale) => request.header(reqwest::header::ACCEPT_LANGUAGE, locale.as_str()),
            None => request,
        };
        match &user.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Transport, status and decode failures surface as the original `reqwest::Error`
    async fn send<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(log_failure)?;
        let response = response.error_for_status().map_err(log_failure)?;
        Ok(response.json::<T>().await.map_err(log_failure)?)
    }
}

fn log_failure(err: reqwest::Error) -> reqwest::Error {
    debug!("Learning-progress request failed: {}", err);
    err
}

#[async_trait]
impl LearningProgress for HttpProgressClient {
    async fn learning_items(&self, user: &UserContext) -> Result<Vec<LearningItem>> {
        let url = self.user_url(user, "");
        debug!("GET {}", url);
        self.send(self.authorize(self.client.get(url), user)).await
    }

    async fn start_learning(&self, user: &UserContext, item: &CatalogItem) -> Result<LaunchInfo> {
        let url = self.user_url(user, &format!("/{}/start", item.id));
        debug!("POST {}", url);
        self.send(self.authorize(self.client.post(url), user)).await
    }

    async fn continue_learning(&self, user: &UserContext, item: &CatalogItem) -> Result<LaunchInfo> {
        let url = self.user_url(user, &format!("/{}/continue", item.id));
        debug!("POST {}", url);
        self.send(self.authorize(self.client.post(url), user)).await
    }

    async fn update_progress(
        &self,
        user: &UserContext,
        item_id: &str,
        update: &ProgressUpdate,
    ) -> Result<LearningItem> {
        let url = self.user_url(user, &format!("/{}/progress", item_id));
        debug!("PUT {}", url);
        self.send(self.authorize(self.client.put(url).json(update), user)).await
    }

    async fn learning_url(&self, user: &UserContext, item_id: &str) -> Result<String> {
        let url = self.user_url(user, &format!("/{}/launch-url", item_id));
        debug!("GET {}", url);
        let response: UrlResponse = self.send(self.authorize(self.client.get(url), user)).await?;
        Ok(response.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_failure_surfaces_unwrapped() {
        let client = HttpProgressClient::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
        let err = client.learning_items(&UserContext::new("u1")).await.unwrap_err();
        let source = err.downcast_ref::<reqwest::Error>().unwrap();
        assert!(source.is_connect() || source.is_request());

        let message = source.to_string();
        let err = crate::error::CatalogError::from(err);
        assert_eq!(err.code(), "collaborator");
        assert_eq!(err.to_string(), message);
        assert!(err.to_string().contains("http://127.0.0.1:1/users/u1/learning"));
    }

    #[test]
    fn test_user_url_strips_trailing_slash() {
        let client = HttpProgressClient::new("https://progress.test/api/", Duration::from_secs(5)).unwrap();
        let user = UserContext::new("42");
        assert_eq!(
            client.user_url(&user, "/m1/start"),
            "https://progress.test/api/users/42/learning/m1/start"
        );
    }
}
