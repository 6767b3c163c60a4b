//! Error types for the catalog engine
//!
//! Hard failures only. Disallowed-but-expected conditions (wrong view type,
//! already in cart, ...) are reported through [`crate::viewtype::ActionResult`]
//! and never reach this enum.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised by the catalog engine
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("User context required for {0}")]
    UserContextRequired(&'static str),

    #[error("Item {id} is not a Direct View item (ViewType {view_type})")]
    NotDirectView { id: String, view_type: u8 },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Concurrent write on {id}: expected version {expected}, found {actual}")]
    ConcurrentWrite { id: String, expected: u64, actual: u64 },

    #[error("Catalog store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("Learning-progress call timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Short machine-readable code, used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound(_) => "not_found",
            CatalogError::UserContextRequired(_) => "user_context_required",
            CatalogError::NotDirectView { .. } => "not_direct_view",
            CatalogError::InvalidArguments(_) => "invalid_arguments",
            CatalogError::UnknownResource(_) => "unknown_resource",
            CatalogError::UnknownTool(_) => "unknown_tool",
            CatalogError::ConcurrentWrite { .. } => "concurrent_write",
            CatalogError::LockPoisoned(_) => "lock_poisoned",
            CatalogError::Timeout(_) => "timeout",
            CatalogError::Collaborator(_) => "collaborator",
            CatalogError::Io(_) => "io",
            CatalogError::Json(_) => "json",
        }
    }
}
