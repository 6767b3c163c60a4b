//! Learning statistics and tab classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{LearningItem, LearningStatus};

/// Items due within this many days count as "due soon"
pub const DUE_SOON_DAYS: i64 = 7;

/// UI tab a learning item is listed under. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearningTab {
    NotStarted,
    InProgress,
    Registered,
    Completed,
    PendingReview,
    /// Cross-cutting view over non-completed items that have a due date
    DueDates,
}

impl LearningTab {
    /// Primary tab for a status
    pub fn classify(status: LearningStatus) -> Self {
        match status {
            LearningStatus::NotAttempted => LearningTab::NotStarted,
            LearningStatus::Incomplete | LearningStatus::Failed => LearningTab::InProgress,
            LearningStatus::Registered | LearningStatus::NotAttended => LearningTab::Registered,
            LearningStatus::Completed | LearningStatus::Passed | LearningStatus::Attended => {
                LearningTab::Completed
            }
            LearningStatus::Grade => LearningTab::PendingReview,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('_', "-").as_str() {
            "not-started" => Some(LearningTab::NotStarted),
            "in-progress" => Some(LearningTab::InProgress),
            "registered" => Some(LearningTab::Registered),
            "completed" => Some(LearningTab::Completed),
            "pending-review" => Some(LearningTab::PendingReview),
            "due-dates" => Some(LearningTab::DueDates),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningTab::NotStarted => "not-started",
            LearningTab::InProgress => "in-progress",
            LearningTab::Registered => "registered",
            LearningTab::Completed => "completed",
            LearningTab::PendingReview => "pending-review",
            LearningTab::DueDates => "due-dates",
        }
    }

    pub fn all() -> [LearningTab; 6] {
        [
            LearningTab::NotStarted,
            LearningTab::InProgress,
            LearningTab::Registered,
            LearningTab::Completed,
            LearningTab::PendingReview,
            LearningTab::DueDates,
        ]
    }

    /// Whether `item` is listed under this tab
    pub fn contains(&self, item: &LearningItem) -> bool {
        match self {
            LearningTab::DueDates => in_due_dates_tab(item),
            tab => LearningTab::classify(item.learning_status) == *tab,
        }
    }
}

pub fn in_due_dates_tab(item: &LearningItem) -> bool {
    !item.learning_status.is_complete() && item.effective_due_date().is_some()
}

/// Aggregate snapshot of a learner's items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total: usize,
    pub due_soon: usize,
    pub overdue: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub registered: usize,
    pub completed: usize,
    pub pending_review: usize,
    /// Minutes
    pub total_time_spent: u64,
    pub certificates_earned: usize,
    pub average_score: f64,
}

pub fn compute_stats(items: &[LearningItem], now: DateTime<Utc>) -> LearningStats {
    let mut stats = LearningStats { total: items.len(), ..Default::default() };
    let mut score_sum = 0.0;
    let mut score_count = 0usize;

    for item in items {
        match LearningTab::classify(item.learning_status) {
            LearningTab::NotStarted => stats.not_started += 1,
            LearningTab::InProgress => stats.in_progress += 1,
            LearningTab::Registered => stats.registered += 1,
            LearningTab::Completed => stats.completed += 1,
            LearningTab::PendingReview => stats.pending_review += 1,
            LearningTab::DueDates => {}
        }

        if !item.learning_status.is_complete() {
            match item.days_to_due(now) {
                Some(days) if days < 0 => stats.overdue += 1,
                Some(days) if days <= DUE_SOON_DAYS => stats.due_soon += 1,
                _ => {}
            }
        }

        stats.total_time_spent += u64::from(item.actual_time_spent.unwrap_or(0));
        if item.certificate_earned == Some(true) {
            stats.certificates_earned += 1;
        }
        if let Some(score) = item.score {
            score_sum += score;
            score_count += 1;
        }
    }

    if score_count > 0 {
        stats.average_score = score_sum / score_count as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use chrono::Duration;

    fn learning(id: &str, status: LearningStatus) -> LearningItem {
        LearningItem::new(CatalogItem::new(id, id, 8), status, Utc::now())
    }

    #[test]
    fn test_every_status_has_a_primary_tab() {
        use LearningStatus::*;
        let expected = [
            (NotAttempted, LearningTab::NotStarted),
            (Incomplete, LearningTab::InProgress),
            (Registered, LearningTab::Registered),
            (Completed, LearningTab::Completed),
            (Grade, LearningTab::PendingReview),
            (Attended, LearningTab::Completed),
            (NotAttended, LearningTab::Registered),
            (Passed, LearningTab::Completed),
            (Failed, LearningTab::InProgress),
        ];
        for (status, tab) in expected {
            assert_eq!(LearningTab::classify(status), tab, "{:?}", status);
        }
    }

    #[test]
    fn test_tab_names_roundtrip() {
        for tab in LearningTab::all() {
            assert_eq!(LearningTab::parse(tab.as_str()), Some(tab));
        }
        assert_eq!(LearningTab::parse("in_progress"), Some(LearningTab::InProgress));
        assert_eq!(LearningTab::parse("archive"), None);
    }

    #[test]
    fn test_due_dates_tab_excludes_completed() {
        let now = Utc::now();
        let open = learning("a", LearningStatus::Incomplete).with_due_date(now + Duration::days(2));
        let done = learning("b", LearningStatus::Completed).with_due_date(now + Duration::days(2));
        assert!(LearningTab::DueDates.contains(&open));
        assert!(!LearningTab::DueDates.contains(&done));
    }

    #[test]
    fn test_compute_stats() {
        let now = Utc::now();
        let mut cert = learning("c", LearningStatus::Passed).with_score(90.0).with_time_spent(40);
        cert.certificate_earned = Some(true);
        let items = vec![
            learning("a", LearningStatus::NotAttempted).with_due_date(now - Duration::days(1)),
            learning("b", LearningStatus::Incomplete)
                .with_due_date(now + Duration::days(3))
                .with_score(70.0)
                .with_time_spent(20),
            cert,
            learning("d", LearningStatus::Grade),
            learning("e", LearningStatus::Registered).with_due_date(now + Duration::days(20)),
        ];

        let stats = compute_stats(&items, now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_soon, 1);
        assert_eq!(stats.not_started, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending_review, 1);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.total_time_spent, 60);
        assert_eq!(stats.certificates_earned, 1);
        assert!((stats.average_score - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_have_zero_average() {
        let stats = compute_stats(&[], Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
    }
}
