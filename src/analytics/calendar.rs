//! Month calendar of due items

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::content_types::calendar_bucket;
use crate::catalog::{CalendarBucket, LearningItem, LearningStatus};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub content_type: &'static str,
    pub bucket: CalendarBucket,
    pub learning_status: LearningStatus,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalendarSummary {
    pub events: usize,
    pub assignments: usize,
    pub assessments: usize,
    pub other: usize,
}

impl CalendarSummary {
    fn tally(&mut self, bucket: CalendarBucket) {
        match bucket {
            CalendarBucket::Events => self.events += 1,
            CalendarBucket::Assignments => self.assignments += 1,
            CalendarBucket::Assessments => self.assessments += 1,
            CalendarBucket::Other => self.other += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningCalendar {
    pub month: u32,
    pub year: i32,
    /// Day of month to the items due that day
    pub days: BTreeMap<u32, Vec<CalendarEntry>>,
    pub summary: CalendarSummary,
    pub total: usize,
}

/// First and last day of a month
pub fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(CatalogError::InvalidArguments(format!(
            "month must be between 1 and 12, got {}",
            month
        )));
    }
    let invalid = || CatalogError::InvalidArguments(format!("invalid year {}", year));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;
    Ok((first, last))
}

/// Calendar for `month`/`year`, each defaulting to the month of `now`
pub fn build_calendar(
    items: &[LearningItem],
    month: Option<u32>,
    year: Option<i32>,
    now: DateTime<Utc>,
) -> Result<LearningCalendar> {
    let month = month.unwrap_or_else(|| now.month());
    let year = year.unwrap_or_else(|| now.year());
    let (first, last) = month_bounds(month, year)?;

    let mut days: BTreeMap<u32, Vec<CalendarEntry>> = BTreeMap::new();
    let mut summary = CalendarSummary::default();
    let mut total = 0;

    for item in items {
        let Some(due_date) = item.effective_due_date() else {
            continue;
        };
        let day = due_date.date_naive();
        if day < first || day > last {
            continue;
        }
        let bucket = calendar_bucket(item.item.content_type_id);
        summary.tally(bucket);
        total += 1;
        days.entry(day.day()).or_default().push(CalendarEntry {
            id: item.id().to_string(),
            title: item.item.title.clone(),
            content_type: item.item.content_type_label(),
            bucket,
            learning_status: item.learning_status,
            due_date,
        });
    }

    for entries in days.values_mut() {
        entries.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    }

    Ok(LearningCalendar { month, year, days, summary, total })
}
