//! Read-only resources addressed by `catalog://` URIs

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{require_user, Gateway};
use crate::catalog::content_types::{self, LEARNING_PATH};
use crate::catalog::{ItemStatus, UserContext};
use crate::engine::CatalogEngine;
use crate::error::{CatalogError, Result};
use crate::search::SearchFilters;

/// Resource listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
    /// Whether reading requires a user context
    pub user_scoped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Items,
    Categories,
    ContentTypes,
    LearningPaths,
    Stats,
    ViewTypeStats,
    MyLearning,
    LearningAnalytics,
}

impl ResourceKind {
    pub fn all() -> [ResourceKind; 8] {
        [
            ResourceKind::Items,
            ResourceKind::Categories,
            ResourceKind::ContentTypes,
            ResourceKind::LearningPaths,
            ResourceKind::Stats,
            ResourceKind::ViewTypeStats,
            ResourceKind::MyLearning,
            ResourceKind::LearningAnalytics,
        ]
    }

    pub fn uri(&self) -> &'static str {
        match self {
            ResourceKind::Items => "catalog://items",
            ResourceKind::Categories => "catalog://categories",
            ResourceKind::ContentTypes => "catalog://content-types",
            ResourceKind::LearningPaths => "catalog://learning-paths",
            ResourceKind::Stats => "catalog://stats",
            ResourceKind::ViewTypeStats => "catalog://viewtype-stats",
            ResourceKind::MyLearning => "catalog://my-learning",
            ResourceKind::LearningAnalytics => "catalog://learning-analytics",
        }
    }

    pub fn parse(uri: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.uri() == uri)
    }

    pub fn describe(&self) -> Resource {
        let (name, description, user_scoped) = match self {
            ResourceKind::Items => ("Catalog items", "All published catalog items", false),
            ResourceKind::Categories => ("Categories", "Catalog categories with item counts", false),
            ResourceKind::ContentTypes => ("Content types", "The content-type registry", false),
            ResourceKind::LearningPaths => ("Learning paths", "Published learning paths", false),
            ResourceKind::Stats => ("Catalog statistics", "Item counts by status and content type", false),
            ResourceKind::ViewTypeStats => (
                "ViewType statistics",
                "ViewType distribution and consistency report",
                false,
            ),
            ResourceKind::MyLearning => ("My learning", "The caller's learning items by tab", true),
            ResourceKind::LearningAnalytics => (
                "Learning analytics",
                "Progress, trends and recommendations for the caller",
                true,
            ),
        };
        Resource {
            uri: self.uri(),
            name,
            description,
            mime_type: "application/json",
            user_scoped,
        }
    }
}

pub fn list_resources() -> Vec<Resource> {
    ResourceKind::all().iter().map(ResourceKind::describe).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Whole-catalog counts, drafts and archived items included
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_items: usize,
    pub published: usize,
    pub draft: usize,
    pub archived: usize,
    pub by_content_type: BTreeMap<String, usize>,
    pub categories: usize,
    /// Mean rating over published items with at least one rating
    pub average_rating: f64,
}

pub fn category_counts(catalog: &CatalogEngine) -> Result<Vec<CategoryCount>> {
    Ok(catalog
        .categories()?
        .into_iter()
        .map(|(name, count)| CategoryCount { name, count })
        .collect())
}

pub fn catalog_stats(catalog: &CatalogEngine) -> Result<CatalogStats> {
    let mut stats = CatalogStats::default();
    let mut rating_sum = 0.0;
    let mut rated = 0usize;

    for item in catalog.store().snapshot()? {
        stats.total_items += 1;
        match item.status {
            ItemStatus::Published => stats.published += 1,
            ItemStatus::Draft => stats.draft += 1,
            ItemStatus::Archived => stats.archived += 1,
        }
        *stats
            .by_content_type
            .entry(item.content_type_label().to_string())
            .or_insert(0) += 1;
        if item.is_published() && item.rating.count > 0 {
            rating_sum += item.rating.average;
            rated += 1;
        }
    }
    stats.categories = catalog.categories()?.len();
    if rated > 0 {
        stats.average_rating = rating_sum / rated as f64;
    }
    Ok(stats)
}

/// Every published item in one page
fn all_published(catalog: &CatalogEngine, extra: SearchFilters, user: Option<&UserContext>) -> Result<Value> {
    let filters = SearchFilters {
        limit: Some(catalog.store().len()?),
        offset: Some(0),
        ..extra
    };
    let results = catalog.search(&filters, user)?;
    Ok(json!({ "items": results.items, "total": results.total }))
}

impl Gateway {
    pub fn list_resources(&self) -> Vec<Resource> {
        list_resources()
    }

    /// Read one resource; unknown URIs are a hard error
    pub async fn read_resource(&self, uri: &str, user: Option<&UserContext>) -> Result<Value> {
        let kind = ResourceKind::parse(uri).ok_or_else(|| CatalogError::UnknownResource(uri.to_string()))?;
        let catalog = self.catalog();

        let value = match kind {
            ResourceKind::Items => all_published(catalog, SearchFilters::default(), user)?,
            ResourceKind::Categories => serde_json::to_value(category_counts(catalog)?)?,
            ResourceKind::ContentTypes => serde_json::to_value(content_types::all())?,
            ResourceKind::LearningPaths => all_published(
                catalog,
                SearchFilters { content_type_id: Some(LEARNING_PATH), ..Default::default() },
                user,
            )?,
            ResourceKind::Stats => serde_json::to_value(catalog_stats(catalog)?)?,
            ResourceKind::ViewTypeStats => json!({
                "stats": catalog.view_type_stats()?,
                "validation": catalog.validation_report()?,
            }),
            ResourceKind::MyLearning => {
                let user = require_user(user, "catalog://my-learning")?;
                serde_json::to_value(self.analytics().my_learning_detailed(user, None).await?)?
            }
            ResourceKind::LearningAnalytics => {
                let user = require_user(user, "catalog://learning-analytics")?;
                serde_json::to_value(self.analytics().get_learning_analytics(user).await?)?
            }
        };
        Ok(value)
    }
}
