//! Catalog data model and shared item store

pub mod content_types;
pub mod item;
pub mod store;

pub use content_types::{CalendarBucket, ContentType};
pub use item::{
    CatalogItem, Difficulty, Enrollment, ItemStatus, LearningItem, LearningStatus, Price, Rating,
    UserContext, ViewType,
};
pub use store::{CatalogStore, Versioned};
