//! Due-date urgency buckets

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{LearningItem, LearningStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DueDateBucket {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    ThisMonth,
    Upcoming,
}

impl DueDateBucket {
    /// Bucket for a day delta (due date minus today, in calendar days)
    pub fn for_delta(days: i64) -> Self {
        match days {
            d if d < 0 => DueDateBucket::Overdue,
            0 => DueDateBucket::Today,
            1 => DueDateBucket::Tomorrow,
            2..=7 => DueDateBucket::ThisWeek,
            8..=14 => DueDateBucket::NextWeek,
            15..=30 => DueDateBucket::ThisMonth,
            _ => DueDateBucket::Upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueItem {
    pub id: String,
    pub title: String,
    pub content_type: &'static str,
    pub learning_status: LearningStatus,
    pub progress: u8,
    pub due_date: DateTime<Utc>,
    pub days_to_due: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateBuckets {
    pub overdue: Vec<DueItem>,
    pub today: Vec<DueItem>,
    pub tomorrow: Vec<DueItem>,
    pub this_week: Vec<DueItem>,
    pub next_week: Vec<DueItem>,
    pub this_month: Vec<DueItem>,
    pub upcoming: Vec<DueItem>,
    pub total: usize,
}

impl DueDateBuckets {
    pub fn bucket(&self, bucket: DueDateBucket) -> &[DueItem] {
        match bucket {
            DueDateBucket::Overdue => &self.overdue,
            DueDateBucket::Today => &self.today,
            DueDateBucket::Tomorrow => &self.tomorrow,
            DueDateBucket::ThisWeek => &self.this_week,
            DueDateBucket::NextWeek => &self.next_week,
            DueDateBucket::ThisMonth => &self.this_month,
            DueDateBucket::Upcoming => &self.upcoming,
        }
    }

    fn bucket_mut(&mut self, bucket: DueDateBucket) -> &mut Vec<DueItem> {
        match bucket {
            DueDateBucket::Overdue => &mut self.overdue,
            DueDateBucket::Today => &mut self.today,
            DueDateBucket::Tomorrow => &mut self.tomorrow,
            DueDateBucket::ThisWeek => &mut self.this_week,
            DueDateBucket::NextWeek => &mut self.next_week,
            DueDateBucket::ThisMonth => &mut self.this_month,
            DueDateBucket::Upcoming => &mut self.upcoming,
        }
    }
}

/// Place every item with an effective due date into exactly one bucket.
/// Each bucket is ordered by due date, soonest first.
pub fn bucket_due_dates(items: &[LearningItem], now: DateTime<Utc>) -> DueDateBuckets {
    let mut buckets = DueDateBuckets::default();

    for item in items {
        let (Some(due_date), Some(days)) = (item.effective_due_date(), item.days_to_due(now)) else {
            continue;
        };
        let entry = DueItem {
            id: item.id().to_string(),
            title: item.item.title.clone(),
            content_type: item.item.content_type_label(),
            learning_status: item.learning_status,
            progress: item.progress,
            due_date,
            days_to_due: days,
        };
        buckets.bucket_mut(DueDateBucket::for_delta(days)).push(entry);
        buckets.total += 1;
    }

    for bucket in [
        &mut buckets.overdue,
        &mut buckets.today,
        &mut buckets.tomorrow,
        &mut buckets.this_week,
        &mut buckets.next_week,
        &mut buckets.this_month,
        &mut buckets.upcoming,
    ] {
        bucket.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use chrono::{Duration, TimeZone};

    fn due_in(id: &str, now: DateTime<Utc>, days: i64) -> LearningItem {
        LearningItem::new(CatalogItem::new(id, id, 689), LearningStatus::Incomplete, now)
            .with_due_date(now + Duration::days(days))
    }

    #[test]
    fn test_delta_boundaries() {
        assert_eq!(DueDateBucket::for_delta(-1), DueDateBucket::Overdue);
        assert_eq!(DueDateBucket::for_delta(0), DueDateBucket::Today);
        assert_eq!(DueDateBucket::for_delta(1), DueDateBucket::Tomorrow);
        assert_eq!(DueDateBucket::for_delta(7), DueDateBucket::ThisWeek);
        assert_eq!(DueDateBucket::for_delta(8), DueDateBucket::NextWeek);
        assert_eq!(DueDateBucket::for_delta(14), DueDateBucket::NextWeek);
        assert_eq!(DueDateBucket::for_delta(30), DueDateBucket::ThisMonth);
        assert_eq!(DueDateBucket::for_delta(31), DueDateBucket::Upcoming);
    }

    #[test]
    fn test_yesterday_and_five_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let items = vec![due_in("late", now, -1), due_in("soon", now, 5)];
        let buckets = bucket_due_dates(&items, now);

        assert_eq!(buckets.overdue.len(), 1);
        assert_eq!(buckets.overdue[0].id, "late");
        assert_eq!(buckets.this_week.len(), 1);
        assert_eq!(buckets.this_week[0].id, "soon");
        assert_eq!(buckets.total, 2);
    }

    #[test]
    fn test_buckets_are_exhaustive_and_exclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let mut items: Vec<_> = (-5..45).map(|d| due_in(&format!("i{}", d), now, d)).collect();
        items.push(LearningItem::new(CatalogItem::new("nodue", "No due", 8), LearningStatus::Incomplete, now));

        let buckets = bucket_due_dates(&items, now);
        let all = [
            DueDateBucket::Overdue,
            DueDateBucket::Today,
            DueDateBucket::Tomorrow,
            DueDateBucket::ThisWeek,
            DueDateBucket::NextWeek,
            DueDateBucket::ThisMonth,
            DueDateBucket::Upcoming,
        ];
        let mut seen: Vec<String> = all
            .iter()
            .flat_map(|b| buckets.bucket(*b).iter().map(|e| e.id.clone()))
            .collect();
        assert_eq!(seen.len(), 50);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 50);
        assert!(!seen.contains(&"nodue".to_string()));
    }

    #[test]
    fn test_next_due_date_takes_precedence() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let mut item = due_in("recurring", now, -3);
        item.next_due_date = Some(now + Duration::days(1));
        let buckets = bucket_due_dates(&[item], now);
        assert_eq!(buckets.tomorrow.len(), 1);
        assert!(buckets.overdue.is_empty());
    }
}
