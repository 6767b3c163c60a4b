//! Learning analytics
//!
//! Pure computations over a learner's items ([`stats`], [`due_dates`],
//! [`calendar`], [`trends`]) plus [`LearningAnalytics`], which fetches the
//! items from the learning-progress service and composes the views.
//! Every function takes `now` explicitly so results are reproducible.

pub mod calendar;
pub mod due_dates;
pub mod stats;
pub mod trends;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::catalog::{LearningItem, UserContext};
use crate::error::Result;
use crate::progress::ProgressTracker;

pub use calendar::{build_calendar, LearningCalendar};
pub use due_dates::{bucket_due_dates, DueDateBucket, DueDateBuckets};
pub use stats::{compute_stats, LearningStats, LearningTab};
pub use trends::{
    CategoryBreakdown, CompletionTrends, ContentTypeTime, Recommendation, WeeklyProgress,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningAnalyticsReport {
    pub overview: LearningStats,
    pub weekly_progress: Vec<WeeklyProgress>,
    pub category_breakdown: BTreeMap<String, CategoryBreakdown>,
    pub time_by_content_type: BTreeMap<String, ContentTypeTime>,
    pub completion_trends: CompletionTrends,
    pub recommendations: Vec<Recommendation>,
}

/// Learning item annotated with its derived tab and urgency
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedLearningItem {
    #[serde(flatten)]
    pub item: LearningItem,
    pub tab: LearningTab,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_due: Option<i64>,
    pub is_overdue: bool,
}

impl DetailedLearningItem {
    pub fn new(item: LearningItem, now: DateTime<Utc>) -> Self {
        Self {
            tab: LearningTab::classify(item.learning_status),
            days_to_due: item.days_to_due(now),
            is_overdue: item.is_overdue(now),
            item,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyLearningDetailed {
    pub stats: LearningStats,
    /// Present when a single tab was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<LearningTab>,
    pub items: Vec<DetailedLearningItem>,
}

/// Items filtered to `tab` (all items when `None`), annotated, stats over the full list
pub fn detailed_view(items: Vec<LearningItem>, tab: Option<LearningTab>, now: DateTime<Utc>) -> MyLearningDetailed {
    let stats = compute_stats(&items, now);
    let items = items
        .into_iter()
        .filter(|item| tab.map(|t| t.contains(item)).unwrap_or(true))
        .map(|item| DetailedLearningItem::new(item, now))
        .collect();
    MyLearningDetailed { stats, tab, items }
}

/// Analytics over live learning-progress data
#[derive(Clone)]
pub struct LearningAnalytics {
    tracker: ProgressTracker,
}

impl LearningAnalytics {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub async fn get_learning_analytics(&self, user: &UserContext) -> Result<LearningAnalyticsReport> {
        let items = self.tracker.learning_items(user).await?;
        let now = Utc::now();
        let recommendations = trends::recommendations(self.tracker.catalog(), user, &items)?;
        debug!(
            "Analytics for {}: {} items, {} recommendations",
            user.user_id,
            items.len(),
            recommendations.len()
        );
        Ok(LearningAnalyticsReport {
            overview: compute_stats(&items, now),
            weekly_progress: trends::weekly_progress(&items, now),
            category_breakdown: trends::category_breakdown(&items),
            time_by_content_type: trends::time_by_content_type(&items),
            completion_trends: trends::completion_trends(&items, now),
            recommendations,
        })
    }

    pub async fn get_learning_due_dates(&self, user: &UserContext) -> Result<DueDateBuckets> {
        let items = self.tracker.learning_items(user).await?;
        Ok(bucket_due_dates(&items, Utc::now()))
    }

    pub async fn get_learning_calendar(
        &self,
        month: Option<u32>,
        year: Option<i32>,
        user: &UserContext,
    ) -> Result<LearningCalendar> {
        // reject a bad month before touching the service
        if let Some(month) = month {
            calendar::month_bounds(month, year.unwrap_or(2000))?;
        }
        let items = self.tracker.learning_items(user).await?;
        build_calendar(&items, month, year, Utc::now())
    }

    pub async fn learning_stats(&self, user: &UserContext) -> Result<LearningStats> {
        let items = self.tracker.learning_items(user).await?;
        Ok(compute_stats(&items, Utc::now()))
    }

    pub async fn my_learning_detailed(
        &self,
        user: &UserContext,
        tab: Option<LearningTab>,
    ) -> Result<MyLearningDetailed> {
        let items = self.tracker.learning_items(user).await?;
        Ok(detailed_view(items, tab, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, LearningStatus};
    use crate::engine::CatalogEngine;
    use crate::error::CatalogError;
    use crate::progress::{InMemoryProgress, MockLearningProgress};
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn analytics_with(items: Vec<LearningItem>) -> LearningAnalytics {
        let catalog = Arc::new(CatalogEngine::from_items(vec![
            CatalogItem::new("m1", "Safety", 8).with_category("Compliance").with_rating(4.2, 3),
            CatalogItem::new("m2", "Leading teams", 8).with_category("Leadership").with_rating(4.8, 9),
        ]));
        let mut seed = HashMap::new();
        seed.insert("u1".to_string(), items);
        let tracker = ProgressTracker::new(
            catalog,
            Arc::new(InMemoryProgress::with_items(seed)),
            std::time::Duration::from_secs(5),
        );
        LearningAnalytics::new(tracker)
    }

    fn learning(id: &str, status: LearningStatus) -> LearningItem {
        LearningItem::new(CatalogItem::new(id, id, 689), status, Utc::now())
    }

    #[test]
    fn test_detailed_view_filters_by_tab() {
        let now = Utc::now();
        let items = vec![
            learning("a", LearningStatus::Incomplete).with_due_date(now + Duration::days(3)),
            learning("b", LearningStatus::Completed).with_due_date(now - Duration::days(3)),
            learning("c", LearningStatus::NotAttempted),
        ];

        let all = detailed_view(items.clone(), None, now);
        assert_eq!(all.items.len(), 3);
        assert_eq!(all.stats.total, 3);

        let due = detailed_view(items.clone(), Some(LearningTab::DueDates), now);
        assert_eq!(due.items.len(), 1);
        assert_eq!(due.items[0].item.id(), "a");
        assert_eq!(due.items[0].days_to_due, Some(3));
        assert_eq!(due.stats.total, 3);

        let done = detailed_view(items, Some(LearningTab::Completed), now);
        assert_eq!(done.items.len(), 1);
        assert!(!done.items[0].is_overdue);
    }

    #[test]
    fn test_analytics_report_composes_all_sections() {
        let analytics = analytics_with(vec![
            learning("m1", LearningStatus::Completed).with_completed_at(Utc::now() - Duration::days(1)),
        ]);
        let user = UserContext::new("u1").with_roles(["People Manager"]);

        let report = tokio_test::block_on(analytics.get_learning_analytics(&user)).unwrap();
        assert_eq!(report.overview.completed, 1);
        assert_eq!(report.weekly_progress.len(), 7);
        assert_eq!(report.completion_trends.trend, "up");
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0].item_ids, vec!["m2"]);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("weeklyProgress").is_some());
        assert!(json.get("timeByContentType").is_some());
    }

    #[tokio::test]
    async fn test_calendar_rejects_bad_month_without_calling_service() {
        let mut mock = MockLearningProgress::new();
        mock.expect_learning_items().times(0);
        let tracker = ProgressTracker::new(
            Arc::new(CatalogEngine::from_items(vec![])),
            Arc::new(mock),
            std::time::Duration::from_secs(5),
        );
        let analytics = LearningAnalytics::new(tracker);

        let err = analytics
            .get_learning_calendar(Some(0), None, &UserContext::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_due_dates_for_unknown_user_are_empty() {
        let analytics = analytics_with(vec![]);
        let buckets = analytics.get_learning_due_dates(&UserContext::new("nobody")).await.unwrap();
        assert_eq!(buckets.total, 0);
    }
}
