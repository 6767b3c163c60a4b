//! Weekly activity, breakdowns, completion trend and recommendations

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::stats::LearningTab;
use crate::catalog::{LearningItem, UserContext};
use crate::engine::CatalogEngine;
use crate::error::Result;
use crate::search::{SearchFilters, SortOrder};

pub const WEEKS: i64 = 7;
pub const MAX_ROLE_RECOMMENDATIONS: usize = 5;
pub const ITEMS_PER_RECOMMENDATION: usize = 3;

const UNCATEGORIZED: &str = "Uncategorized";

/// Role keyword to suggested category. Matched case-insensitively on whole words.
const ROLE_CATEGORIES: &[(&str, &str)] = &[
    ("manager", "Leadership"),
    ("lead", "Leadership"),
    ("developer", "Technology"),
    ("engineer", "Technology"),
    ("sales", "Sales"),
    ("support", "Customer Service"),
    ("hr", "Compliance"),
    ("designer", "Design"),
    ("analyst", "Data"),
    ("new hire", "Onboarding"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub week_start: DateTime<Utc>,
    pub progress_events: usize,
    pub completions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// Minutes
    pub time_spent: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeTime {
    pub total_time: u64,
    pub item_count: usize,
    pub average_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTrends {
    pub last_7_days: usize,
    pub last_30_days: usize,
    /// "up" or "down"
    pub trend: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Role,
    Popular,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub reason: String,
    pub item_ids: Vec<String>,
}

fn in_window(at: Option<DateTime<Utc>>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    matches!(at, Some(t) if t > start && t <= end)
}

/// Seven trailing weeks ending at `now`, oldest first
pub fn weekly_progress(items: &[LearningItem], now: DateTime<Utc>) -> Vec<WeeklyProgress> {
    (0..WEEKS)
        .map(|i| {
            let week_start = now - Duration::weeks(WEEKS - i);
            let week_end = week_start + Duration::weeks(1);
            WeeklyProgress {
                week_start,
                progress_events: items
                    .iter()
                    .filter(|li| in_window(li.last_accessed, week_start, week_end))
                    .count(),
                completions: items
                    .iter()
                    .filter(|li| in_window(li.completed_at, week_start, week_end))
                    .count(),
            }
        })
        .collect()
}

pub fn category_breakdown(items: &[LearningItem]) -> BTreeMap<String, CategoryBreakdown> {
    let mut breakdown: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();
    for item in items {
        let category = if item.item.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            item.item.category.clone()
        };
        let entry = breakdown.entry(category).or_default();
        entry.total += 1;
        match LearningTab::classify(item.learning_status) {
            LearningTab::Completed => entry.completed += 1,
            LearningTab::InProgress => entry.in_progress += 1,
            _ => {}
        }
        entry.time_spent += u64::from(item.actual_time_spent.unwrap_or(0));
    }
    breakdown
}

/// Keyed by content-type label
pub fn time_by_content_type(items: &[LearningItem]) -> BTreeMap<String, ContentTypeTime> {
    let mut by_type: BTreeMap<String, ContentTypeTime> = BTreeMap::new();
    for item in items {
        let entry = by_type.entry(item.item.content_type_label().to_string()).or_default();
        entry.total_time += u64::from(item.actual_time_spent.unwrap_or(0));
        entry.item_count += 1;
    }
    for entry in by_type.values_mut() {
        entry.average_time = entry.total_time as f64 / entry.item_count as f64;
    }
    by_type
}

pub fn completion_trends(items: &[LearningItem], now: DateTime<Utc>) -> CompletionTrends {
    let completed_within = |days: i64| {
        let start = now - Duration::days(days);
        items.iter().filter(|li| in_window(li.completed_at, start, now)).count()
    };
    let last_7_days = completed_within(7);
    let last_30_days = completed_within(30);
    let trend = if last_7_days as f64 > last_30_days as f64 / 4.0 { "up" } else { "down" };
    CompletionTrends { last_7_days, last_30_days, trend }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when the keyword's words appear as a contiguous run in the role
fn role_matches(role: &[String], keyword: &[String]) -> bool {
    !keyword.is_empty() && role.windows(keyword.len()).any(|w| w == keyword)
}

/// Categories suggested for the user's roles, deduplicated, in table order
pub fn role_categories(roles: &[String]) -> Vec<&'static str> {
    let roles: Vec<Vec<String>> = roles.iter().map(|r| words(r)).collect();
    let mut categories = Vec::new();
    for (keyword, category) in ROLE_CATEGORIES {
        let keyword = words(keyword);
        if roles.iter().any(|r| role_matches(r, &keyword)) && !categories.contains(category) {
            categories.push(*category);
        }
    }
    categories.truncate(MAX_ROLE_RECOMMENDATIONS);
    categories
}

fn top_rated(
    catalog: &CatalogEngine,
    category: Option<&str>,
    exclude: &HashSet<&str>,
) -> Result<Vec<String>> {
    let filters = SearchFilters {
        category: category.map(str::to_string),
        sort_by: Some("rating".to_string()),
        sort_order: Some(SortOrder::Desc),
        limit: Some(ITEMS_PER_RECOMMENDATION + exclude.len()),
        ..Default::default()
    };
    Ok(catalog
        .search(&filters, None)?
        .items
        .into_iter()
        .filter(|item| !exclude.contains(item.id.as_str()))
        .take(ITEMS_PER_RECOMMENDATION)
        .map(|item| item.id)
        .collect())
}

/// Role-based suggestions followed by one "popular" entry.
/// Items already in the user's learning list are skipped.
pub fn recommendations(
    catalog: &CatalogEngine,
    user: &UserContext,
    learning: &[LearningItem],
) -> Result<Vec<Recommendation>> {
    let exclude: HashSet<&str> = learning.iter().map(|li| li.id()).collect();
    let mut out = Vec::new();

    for category in role_categories(&user.roles) {
        out.push(Recommendation {
            kind: RecommendationKind::Role,
            title: format!("Recommended {} learning", category),
            category: Some(category.to_string()),
            reason: "Based on your role".to_string(),
            item_ids: top_rated(catalog, Some(category), &exclude)?,
        });
    }

    out.push(Recommendation {
        kind: RecommendationKind::Popular,
        title: "Popular in the catalog".to_string(),
        category: None,
        reason: "Highly rated by other learners".to_string(),
        item_ids: top_rated(catalog, None, &exclude)?,
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, LearningStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn item(id: &str, category: &str, ct: u32, status: LearningStatus) -> LearningItem {
        LearningItem::new(CatalogItem::new(id, id, ct).with_category(category), status, now())
    }

    #[test]
    fn test_weekly_progress_is_oldest_first() {
        let items = vec![
            item("a", "Tech", 8, LearningStatus::Incomplete).with_last_accessed(now() - Duration::days(1)),
            item("b", "Tech", 8, LearningStatus::Completed)
                .with_last_accessed(now() - Duration::days(45))
                .with_completed_at(now() - Duration::days(45)),
            item("c", "Tech", 8, LearningStatus::Completed)
                .with_last_accessed(now() - Duration::days(2))
                .with_completed_at(now() - Duration::days(2)),
        ];
        let weeks = weekly_progress(&items, now());
        assert_eq!(weeks.len(), 7);
        assert!(weeks[0].week_start < weeks[6].week_start);
        assert_eq!(weeks[6].progress_events, 2);
        assert_eq!(weeks[6].completions, 1);
        assert_eq!(weeks[0].progress_events + weeks[0].completions, 2);
    }

    #[test]
    fn test_category_breakdown_and_time() {
        let items = vec![
            item("a", "Tech", 11, LearningStatus::Completed).with_time_spent(30),
            item("b", "Tech", 11, LearningStatus::Failed).with_time_spent(10),
            item("c", "", 8, LearningStatus::Registered),
        ];
        let breakdown = category_breakdown(&items);
        assert_eq!(
            breakdown["Tech"],
            CategoryBreakdown { total: 2, completed: 1, in_progress: 1, time_spent: 40 }
        );
        assert_eq!(breakdown["Uncategorized"].total, 1);

        let times = time_by_content_type(&items);
        assert_eq!(times["Video and Audio"].total_time, 40);
        assert_eq!(times["Video and Audio"].average_time, 20.0);
        assert_eq!(times["Learning Module"].average_time, 0.0);
    }

    #[test]
    fn test_completion_trend_direction() {
        let done = |id: &str, days: i64| {
            item(id, "Tech", 8, LearningStatus::Completed).with_completed_at(now() - Duration::days(days))
        };
        let rising = vec![done("a", 1), done("b", 20)];
        let trends = completion_trends(&rising, now());
        assert_eq!((trends.last_7_days, trends.last_30_days, trends.trend), (1, 2, "up"));

        let falling = vec![done("a", 10), done("b", 20)];
        assert_eq!(completion_trends(&falling, now()).trend, "down");
        assert_eq!(completion_trends(&[], now()).trend, "down");
    }

    #[test]
    fn test_role_categories_match_words_and_cap() {
        let roles = vec!["Senior Software Engineer".to_string(), "Team Lead".to_string()];
        assert_eq!(role_categories(&roles), vec!["Leadership", "Technology"]);

        let many: Vec<String> = ["manager", "developer", "sales", "support", "hr", "designer", "analyst"]
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(role_categories(&many).len(), MAX_ROLE_RECOMMENDATIONS);
        assert!(role_categories(&[]).is_empty());
    }

    #[test]
    fn test_role_keywords_do_not_match_inside_words() {
        let roles = vec!["Three-D Artist".to_string(), "Chrome Extension Developer".to_string()];
        assert_eq!(role_categories(&roles), vec!["Technology"]);

        let roles = vec!["HR Business Partner".to_string(), "new-hire".to_string()];
        assert_eq!(role_categories(&roles), vec!["Compliance", "Onboarding"]);
    }

    #[test]
    fn test_popular_recommendation_is_always_last() {
        let catalog = CatalogEngine::from_items(vec![
            CatalogItem::new("t1", "Rust", 8).with_category("Technology").with_rating(4.9, 10),
            CatalogItem::new("t2", "Go", 8).with_category("Technology").with_rating(4.1, 10),
            CatalogItem::new("s1", "Pitching", 8).with_category("Sales").with_rating(4.5, 10),
        ]);
        let user = UserContext::new("u1").with_roles(["developer"]);
        let learning = vec![item("t1", "Technology", 8, LearningStatus::Incomplete)];

        let recs = recommendations(&catalog, &user, &learning).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, RecommendationKind::Role);
        assert_eq!(recs[0].item_ids, vec!["t2"]);
        assert_eq!(recs[1].kind, RecommendationKind::Popular);
        assert_eq!(recs[1].item_ids, vec!["s1", "t2"]);

        let anonymous = recommendations(&catalog, &UserContext::new("u2"), &[]).unwrap();
        assert_eq!(anonymous.len(), 1);
        assert_eq!(anonymous[0].item_ids, vec!["t1", "s1", "t2"]);
    }
}
