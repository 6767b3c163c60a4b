//! In-memory learning-progress provider
//!
//! Keeps per-user learning items in process memory. Seeded from a JSON file
//! (object of user id to learning item array) for local runs.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

use super::{LaunchInfo, LearningProgress, ProgressUpdate};
use crate::catalog::{CatalogItem, LearningItem, LearningStatus, UserContext};

const DEFAULT_LAUNCH_URL: &str = "https://learn.example.com/launch/{id}";

pub struct InMemoryProgress {
    items: RwLock<HashMap<String, Vec<LearningItem>>>,
    launch_url: String,
}

impl InMemoryProgress {
    pub fn new() -> Self {
        Self::with_items(HashMap::new())
    }

    pub fn with_items(items: HashMap<String, Vec<LearningItem>>) -> Self {
        Self {
            items: RwLock::new(items),
            launch_url: DEFAULT_LAUNCH_URL.to_string(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read learning snapshot {}", path.display()))?;
        let items: HashMap<String, Vec<LearningItem>> = serde_json::from_str(&contents)
            .context("Failed to parse learning snapshot")?;
        Ok(Self::with_items(items))
    }

    fn launch_url_for(&self, item_id: &str) -> String {
        self.launch_url.replace("{id}", item_id)
    }

    fn launch_info(&self, item: &LearningItem) -> LaunchInfo {
        LaunchInfo {
            item_id: item.id().to_string(),
            url: self.launch_url_for(item.id()),
            status: item.learning_status,
            progress: item.progress,
            last_accessed: item.last_accessed,
        }
    }
}

impl Default for InMemoryProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LearningProgress for InMemoryProgress {
    async fn learning_items(&self, user: &UserContext) -> Result<Vec<LearningItem>> {
        Ok(self.items.read().await.get(&user.user_id).cloned().unwrap_or_default())
    }

    async fn start_learning(&self, user: &UserContext, item: &CatalogItem) -> Result<LaunchInfo> {
        let now = Utc::now();
        let mut items = self.items.write().await;
        let list = items.entry(user.user_id.clone()).or_default();

        let entry = match list.iter_mut().position(|li| li.id() == item.id) {
            Some(idx) => &mut list[idx],
            None => {
                list.push(LearningItem::new(item.clone(), LearningStatus::NotAttempted, now));
                let last = list.len() - 1;
                &mut list[last]
            }
        };
        if entry.learning_status == LearningStatus::NotAttempted {
            entry.learning_status = LearningStatus::Incomplete;
        }
        entry.last_accessed = Some(now);
        Ok(self.launch_info(entry))
    }

    async fn continue_learning(&self, user: &UserContext, item: &CatalogItem) -> Result<LaunchInfo> {
        let mut items = self.items.write().await;
        let Some(entry) = items
            .get_mut(&user.user_id)
            .and_then(|list| list.iter_mut().find(|li| li.id() == item.id))
        else {
            bail!("{} has not started {}", user.user_id, item.id);
        };
        entry.last_accessed = Some(Utc::now());
        Ok(self.launch_info(entry))
    }

    async fn update_progress(
        &self,
        user: &UserContext,
        item_id: &str,
        update: &ProgressUpdate,
    ) -> Result<LearningItem> {
        let now = Utc::now();
        let mut items = self.items.write().await;
        let Some(entry) = items
            .get_mut(&user.user_id)
            .and_then(|list| list.iter_mut().find(|li| li.id() == item_id))
        else {
            bail!("{} has not started {}", user.user_id, item_id);
        };

        entry.progress = update.progress.min(100);
        entry.last_accessed = Some(now);
        if let Some(minutes) = update.time_spent {
            entry.actual_time_spent = Some(entry.actual_time_spent.unwrap_or(0).saturating_add(minutes));
        }
        if let Some(score) = update.score {
            entry.score = Some(score);
        }
        match update.status {
            Some(status) => entry.learning_status = status,
            None if entry.progress == 100 => entry.learning_status = LearningStatus::Completed,
            None if entry.learning_status == LearningStatus::NotAttempted => {
                entry.learning_status = LearningStatus::Incomplete
            }
            None => {}
        }
        if entry.learning_status.is_complete() && entry.completed_at.is_none() {
            entry.completed_at = Some(now);
        }
        Ok(entry.clone())
    }

    async fn learning_url(&self, _user: &UserContext, item_id: &str) -> Result<String> {
        Ok(self.launch_url_for(item_id))
    }
}
