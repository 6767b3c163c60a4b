//! Catalog and learning item types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::content_types;

/// Primary UI action for a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ViewType {
    /// Opens directly in a viewer
    DirectView = 1,
    /// Enrolled into the learner's list
    MyLearning = 2,
    /// Purchased through the cart
    Cart = 3,
}

impl ViewType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewType::DirectView => "Direct View",
            ViewType::MyLearning => "Add to My Learning",
            ViewType::Cart => "Add to Cart",
        }
    }
}

impl Default for ViewType {
    fn default() -> Self {
        ViewType::MyLearning
    }
}

impl TryFrom<u8> for ViewType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ViewType::DirectView),
            2 => Ok(ViewType::MyLearning),
            3 => Ok(ViewType::Cart),
            other => Err(format!("invalid viewType {}, expected 1, 2 or 3", other)),
        }
    }
}

impl From<ViewType> for u8 {
    fn from(value: ViewType) -> Self {
        value.as_u8()
    }
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}

/// Publication status, owned by the authoring system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Published,
    Draft,
    Archived,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Published
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrolled: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// A catalog entry as ingested from the authoring system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content_type_id: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub enrollment: Enrollment,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_view_url: Option<String>,
    #[serde(default)]
    pub is_in_my_learning: bool,
    #[serde(default)]
    pub is_in_cart: bool,
}

impl CatalogItem {
    /// Create a published, free item with neutral defaults
    pub fn new(id: impl Into<String>, title: impl Into<String>, content_type_id: u32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            content_type_id,
            category: String::new(),
            difficulty: Difficulty::default(),
            duration: 0,
            rating: Rating::default(),
            enrollment: Enrollment::default(),
            status: ItemStatus::Published,
            price: None,
            tags: BTreeSet::new(),
            author: None,
            created_at: now,
            updated_at: now,
            view_type: ViewType::default(),
            direct_view_url: None,
            is_in_my_learning: false,
            is_in_cart: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_price(mut self, amount: f64, currency: impl Into<String>) -> Self {
        self.price = Some(Price::new(amount, currency));
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_view_type(mut self, view_type: ViewType) -> Self {
        self.view_type = view_type;
        self
    }

    pub fn with_rating(mut self, average: f64, count: u32) -> Self {
        self.rating = Rating { average, count };
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    pub fn content_type_label(&self) -> &'static str {
        content_types::label(self.content_type_id)
    }

    pub fn is_published(&self) -> bool {
        self.status == ItemStatus::Published
    }

    /// True when the item carries a strictly positive price
    pub fn has_valid_price(&self) -> bool {
        self.price.as_ref().map(|p| p.amount > 0.0).unwrap_or(false)
    }
}

/// Learner-side status as reported by the learning-progress service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningStatus {
    #[serde(rename = "not attempted", alias = "not_attempted")]
    NotAttempted,
    #[serde(rename = "incomplete")]
    Incomplete,
    #[serde(rename = "registered")]
    Registered,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "grade")]
    Grade,
    #[serde(rename = "attended")]
    Attended,
    #[serde(rename = "notattended", alias = "not_attended")]
    NotAttended,
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "failed")]
    Failed,
}

impl LearningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStatus::NotAttempted => "not attempted",
            LearningStatus::Incomplete => "incomplete",
            LearningStatus::Registered => "registered",
            LearningStatus::Completed => "completed",
            LearningStatus::Grade => "grade",
            LearningStatus::Attended => "attended",
            LearningStatus::NotAttended => "notattended",
            LearningStatus::Passed => "passed",
            LearningStatus::Failed => "failed",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            LearningStatus::Completed | LearningStatus::Passed | LearningStatus::Attended
        )
    }
}

/// A catalog item augmented with one learner's progress against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub learning_status: LearningStatus,
    /// 0-100
    #[serde(default)]
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_time_spent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_earned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<DateTime<Utc>>,
}

impl LearningItem {
    pub fn new(item: CatalogItem, learning_status: LearningStatus, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            item,
            learning_status,
            progress: 0,
            enrolled_at,
            last_accessed: None,
            completed_at: None,
            actual_time_spent: None,
            attempts: None,
            score: None,
            passing_score: None,
            certificate_earned: None,
            due_date: None,
            next_due_date: None,
        }
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = Some(at);
        self
    }

    pub fn with_time_spent(mut self, minutes: u32) -> Self {
        self.actual_time_spent = Some(minutes);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Effective due date: the next recurrence wins over the original due date
    pub fn effective_due_date(&self) -> Option<DateTime<Utc>> {
        self.next_due_date.or(self.due_date)
    }

    /// Whole calendar days (UTC) from `now` to the due date; negative when past
    pub fn days_to_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.effective_due_date()
            .map(|due| (due.date_naive() - now.date_naive()).num_days())
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.learning_status.is_complete()
            && self.days_to_due(now).map(|d| d < 0).unwrap_or(false)
    }
}

/// Identity supplied by the session layer; trusted as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), ..Default::default() }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}
