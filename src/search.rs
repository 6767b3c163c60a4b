//! Search & filter engine
//!
//! Predicate filtering, sorting and pagination over published catalog items.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::catalog::{CatalogItem, UserContext, ViewType};
use crate::engine::CatalogEngine;
use crate::error::Result;

pub const DEFAULT_LIMIT: usize = 10;

/// Search parameters; every supplied field is an independent AND-ed predicate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content_type_id: Option<u32>,
    /// Content-type label, e.g. "Video and Audio"
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Matches when the item carries any of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_type: Option<ViewType>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sortable field; unknown names fall back to `CreatedAt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Rating,
    Enrollment,
    CreatedAt,
    Duration,
    ViewType,
}

impl SortKey {
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().replace('_', "").as_str() {
            "title" => SortKey::Title,
            "rating" => SortKey::Rating,
            "enrollment" => SortKey::Enrollment,
            "duration" => SortKey::Duration,
            "viewtype" => SortKey::ViewType,
            _ => SortKey::CreatedAt,
        }
    }

    fn compare(self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        match self {
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Rating => a.rating.average.total_cmp(&b.rating.average),
            SortKey::Enrollment => a.enrollment.enrolled.cmp(&b.enrollment.enrolled),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Duration => a.duration.cmp(&b.duration),
            SortKey::ViewType => a.view_type.cmp(&b.view_type),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub items: Vec<CatalogItem>,
    /// Matches before pagination
    pub total: usize,
    pub has_more: bool,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl SearchFilters {
    /// True when `item` passes every supplied predicate
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = query.to_lowercase();
            let hit = contains_ci(&item.title, &q)
                || contains_ci(&item.description, &q)
                || item.tags.iter().any(|t| contains_ci(t, &q))
                || item.author.as_deref().map(|a| contains_ci(a, &q)).unwrap_or(false);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !item.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(id) = self.content_type_id {
            if item.content_type_id != id {
                return false;
            }
        }
        if let Some(name) = &self.content_type {
            if !item.content_type_label().eq_ignore_ascii_case(name.trim()) {
                return false;
            }
        }
        if let Some(difficulty) = &self.difficulty {
            if !item.difficulty.as_str().eq_ignore_ascii_case(difficulty) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            let needle = author.to_lowercase();
            if !item.author.as_deref().map(|a| contains_ci(a, &needle)).unwrap_or(false) {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let hit = self
                .tags
                .iter()
                .any(|wanted| item.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)));
            if !hit {
                return false;
            }
        }
        if let Some(view_type) = self.view_type {
            if item.view_type != view_type {
                return false;
            }
        }
        true
    }
}

/// Filter, sort and paginate `items`. Draft and archived items never match.
///
/// Ties on the sort key are broken by ascending id so pages stay stable.
pub fn run_search(items: Vec<CatalogItem>, filters: &SearchFilters) -> SearchResults {
    let mut matched: Vec<CatalogItem> = items
        .into_iter()
        .filter(|item| item.is_published() && filters.matches(item))
        .collect();

    if let Some(sort_by) = &filters.sort_by {
        let key = SortKey::parse(sort_by);
        let order = filters.sort_order.unwrap_or_default();
        matched.sort_by(|a, b| {
            let primary = match order {
                SortOrder::Asc => key.compare(a, b),
                SortOrder::Desc => key.compare(b, a),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
    }

    let total = matched.len();
    let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = filters.offset.unwrap_or(0);
    let items: Vec<CatalogItem> = matched.into_iter().skip(offset).take(limit).collect();

    SearchResults {
        items,
        total,
        has_more: offset.saturating_add(limit) < total,
    }
}

impl CatalogEngine {
    /// Search published items
    pub fn search(&self, filters: &SearchFilters, user: Option<&UserContext>) -> Result<SearchResults> {
        let results = run_search(self.store.snapshot()?, filters);
        debug!(
            "Search by {} matched {} items (returned {})",
            user.map(|u| u.user_id.as_str()).unwrap_or("anonymous"),
            results.total,
            results.items.len()
        );
        Ok(results)
    }

    /// Distinct categories of published items with their item counts, sorted by name
    pub fn categories(&self) -> Result<Vec<(String, usize)>> {
        let mut counts = std::collections::BTreeMap::new();
        for item in self.store.snapshot()?.iter().filter(|i| i.is_published()) {
            if !item.category.is_empty() {
                *counts.entry(item.category.clone()).or_insert(0usize) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemStatus;
    use chrono::{Duration, Utc};

    fn catalog() -> Vec<CatalogItem> {
        let base = Utc::now() - Duration::days(30);
        vec![
            CatalogItem::new("a", "Rust Basics", 8)
                .with_category("Technology")
                .with_tags(["rust", "programming"])
                .with_author("Ferris Crab")
                .with_rating(4.5, 10)
                .with_created_at(base),
            CatalogItem::new("b", "Leadership 101", 8)
                .with_category("Leadership")
                .with_description("Lead teams with confidence")
                .with_rating(4.5, 3)
                .with_created_at(base + Duration::days(1)),
            CatalogItem::new("c", "Safety video", 11)
                .with_category("Compliance")
                .with_tags(["safety"])
                .with_rating(3.0, 7)
                .with_created_at(base + Duration::days(2)),
            CatalogItem::new("d", "Draft course", 8)
                .with_category("Technology")
                .with_status(ItemStatus::Draft),
            CatalogItem::new("e", "Old course", 8)
                .with_category("Technology")
                .with_status(ItemStatus::Archived),
        ]
    }

    #[test]
    fn test_only_published_items_are_returned() {
        let results = run_search(catalog(), &SearchFilters::default());
        assert_eq!(results.total, 3);
        assert!(results.items.iter().all(|i| i.is_published()));
    }

    #[test]
    fn test_query_matches_title_description_tag_or_author() {
        let by = |q: &str| {
            let filters = SearchFilters { query: Some(q.to_string()), ..Default::default() };
            run_search(catalog(), &filters).items.into_iter().map(|i| i.id).collect::<Vec<_>>()
        };
        assert_eq!(by("RUST"), vec!["a"]);
        assert_eq!(by("confidence"), vec!["b"]);
        assert_eq!(by("safety"), vec!["c"]);
        assert_eq!(by("ferris"), vec!["a"]);
        assert!(by("draft").is_empty());
    }

    #[test]
    fn test_filters_are_anded() {
        let filters = SearchFilters {
            category: Some("technology".to_string()),
            tags: vec!["safety".to_string()],
            ..Default::default()
        };
        assert_eq!(run_search(catalog(), &filters).total, 0);
    }

    #[test]
    fn test_content_type_name_filter() {
        let filters = SearchFilters {
            content_type: Some("video and audio".to_string()),
            ..Default::default()
        };
        let results = run_search(catalog(), &filters);
        assert_eq!(results.items.len(), 1);
        assert_eq!(results.items[0].id, "c");
    }

    #[test]
    fn test_sort_ties_break_by_id() {
        let filters = SearchFilters {
            sort_by: Some("rating".to_string()),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        let ids: Vec<_> = run_search(catalog(), &filters).items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_sort_key_falls_back_to_created_at() {
        let filters = SearchFilters {
            sort_by: Some("popularity".to_string()),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let ids: Vec<_> = run_search(catalog(), &filters).items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pagination_reports_total_and_has_more() {
        let filters = SearchFilters { limit: Some(2), offset: Some(0), ..Default::default() };
        let first = run_search(catalog(), &filters);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, 3);
        assert!(first.has_more);

        let filters = SearchFilters { limit: Some(2), offset: Some(2), ..Default::default() };
        let second = run_search(catalog(), &filters);
        assert_eq!(second.items.len(), 1);
        assert!(!second.has_more);
    }

    #[test]
    fn test_limit_equal_to_total_returns_everything() {
        let total = run_search(catalog(), &SearchFilters::default()).total;
        let filters = SearchFilters { limit: Some(total), offset: Some(0), ..Default::default() };
        let page = run_search(catalog(), &filters);
        assert_eq!(page.items.len(), total);
        assert!(!page.has_more);
    }

    #[test]
    fn test_categories_skip_unpublished() {
        let engine = CatalogEngine::from_items(catalog());
        let categories = engine.categories().unwrap();
        assert_eq!(
            categories,
            vec![
                ("Compliance".to_string(), 1),
                ("Leadership".to_string(), 1),
                ("Technology".to_string(), 1),
            ]
        );
    }
}
