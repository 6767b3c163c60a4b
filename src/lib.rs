//! Catalog Engine - catalog query and learning-progress library
//!
//! Holds an in-memory catalog and exposes it as resources and tools:
//! - Parameterized search over published items
//! - ViewType classification (Direct View / My Learning / Cart) and its actions
//! - Consistency validation with deterministic auto-repair
//! - Learning analytics over an external learning-progress service
//!
//! # Example
//!
//! ```ignore
//! use catalog_engine::{CatalogEngine, CatalogItem, config::ViewUrlConfig};
//!
//! let engine = CatalogEngine::ingest(
//!     vec![CatalogItem::new("v1", "Intro", 11)],
//!     ViewUrlConfig::default(),
//! )?;
//! let link = engine.get_direct_view_url("v1")?;
//! assert_eq!(link.url, "https://video-player.example.com/v1");
//! ```

// Core modules
pub mod error;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod search;
pub mod viewtype;
pub mod validator;

// Learning progress and analytics
pub mod progress;
pub mod analytics;

// Outer surfaces
pub mod gateway;
pub mod server;
pub mod cli;

pub use analytics::{LearningAnalytics, LearningStats, LearningTab};
pub use catalog::{CatalogItem, CatalogStore, LearningItem, LearningStatus, UserContext, ViewType};
pub use config::Config;
pub use engine::CatalogEngine;
pub use error::{CatalogError, Result};
pub use gateway::{Gateway, Tool, ToolResult};
pub use progress::{InMemoryProgress, LearningProgress, ProgressTracker, ProgressUpdate};
pub use search::{SearchFilters, SearchResults, SortOrder};
pub use validator::{ValidationReport, ViewTypeIssue};
pub use viewtype::{ActionResult, DirectViewLink, ViewTypeStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Catalog query and learning-progress engine", NAME, VERSION)
}
