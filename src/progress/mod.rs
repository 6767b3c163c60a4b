//! Learning-progress collaborator
//!
//! The external service owns learner status. This module defines the seam
//! ([`LearningProgress`]), two implementations, and [`ProgressTracker`], which
//! bounds every call with a timeout and resolves catalog items first.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::{CatalogItem, LearningItem, LearningStatus, UserContext, ViewType};
use crate::config::ProgressConfig;
use crate::engine::CatalogEngine;
use crate::error::{CatalogError, Result};

pub use http::HttpProgressClient;
pub use memory::InMemoryProgress;

/// Progress report sent by a player or the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// 0-100
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LearningStatus>,
    /// Minutes spent in this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Where to send the learner and what state they are in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInfo {
    pub item_id: String,
    pub url: String,
    pub status: LearningStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Learning-progress service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LearningProgress: Send + Sync {
    /// Every learning item of the user
    async fn learning_items(&self, user: &UserContext) -> anyhow::Result<Vec<LearningItem>>;

    async fn start_learning(&self, user: &UserContext, item: &CatalogItem) -> anyhow::Result<LaunchInfo>;

    async fn continue_learning(&self, user: &UserContext, item: &CatalogItem) -> anyhow::Result<LaunchInfo>;

    async fn update_progress(
        &self,
        user: &UserContext,
        item_id: &str,
        update: &ProgressUpdate,
    ) -> anyhow::Result<LearningItem>;

    async fn learning_url(&self, user: &UserContext, item_id: &str) -> anyhow::Result<String>;
}

/// Build the configured provider: HTTP when a base URL is set, otherwise in-memory
pub fn provider_from_config(config: &ProgressConfig) -> anyhow::Result<Arc<dyn LearningProgress>> {
    if let Some(base_url) = &config.base_url {
        info!("Using learning-progress service at {}", base_url);
        let client = HttpProgressClient::new(base_url, Duration::from_secs(config.timeout_secs))?;
        return Ok(Arc::new(client));
    }
    match &config.snapshot_path {
        Some(path) => {
            info!("Seeding in-memory learning progress from {}", path.display());
            Ok(Arc::new(InMemoryProgress::from_file(path)?))
        }
        None => Ok(Arc::new(InMemoryProgress::new())),
    }
}

/// Timeout-bounded access to the learning-progress service
#[derive(Clone)]
pub struct ProgressTracker {
    catalog: Arc<CatalogEngine>,
    provider: Arc<dyn LearningProgress>,
    timeout: Duration,
}

impl ProgressTracker {
    pub fn new(catalog: Arc<CatalogEngine>, provider: Arc<dyn LearningProgress>, timeout: Duration) -> Self {
        Self { catalog, provider, timeout }
    }

    pub fn catalog(&self) -> &Arc<CatalogEngine> {
        &self.catalog
    }

    /// Run a collaborator call under the configured timeout; errors surface unwrapped
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(CatalogError::from),
            Err(_) => Err(CatalogError::Timeout(self.timeout.as_secs())),
        }
    }

    pub async fn learning_items(&self, user: &UserContext) -> Result<Vec<LearningItem>> {
        let items = self.bounded(self.provider.learning_items(user)).await?;
        debug!("Fetched {} learning items for {}", items.len(), user.user_id);
        Ok(items)
    }

    pub async fn start_learning(&self, user: &UserContext, id: &str) -> Result<LaunchInfo> {
        let item = self.catalog.get_item(id)?;
        let launch = self.bounded(self.provider.start_learning(user, &item)).await?;
        info!("User {} started {}", user.user_id, id);
        Ok(launch)
    }

    pub async fn continue_learning(&self, user: &UserContext, id: &str) -> Result<LaunchInfo> {
        let item = self.catalog.get_item(id)?;
        self.bounded(self.provider.continue_learning(user, &item)).await
    }

    pub async fn update_learning_progress(
        &self,
        user: &UserContext,
        id: &str,
        update: &ProgressUpdate,
    ) -> Result<LearningItem> {
        if update.progress > 100 {
            return Err(CatalogError::InvalidArguments(format!(
                "progress must be between 0 and 100, got {}",
                update.progress
            )));
        }
        self.catalog.get_item(id)?;
        self.bounded(self.provider.update_progress(user, id, update)).await
    }

    /// Direct View items resolve locally; everything else asks the service
    pub async fn get_learning_url(&self, user: &UserContext, id: &str) -> Result<String> {
        let item = self.catalog.get_item(id)?;
        if item.view_type == ViewType::DirectView {
            return Ok(self.catalog.get_direct_view_url(id)?.url);
        }
        self.bounded(self.provider.learning_url(user, id)).await
    }
}
