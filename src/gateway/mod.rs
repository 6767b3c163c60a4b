//! Gateway - resources and tools over the catalog and learning engines
//!
//! A flat namespace: callers read `catalog://` resources or call named tools
//! with JSON arguments and an optional user context. Identity-scoped
//! operations reject calls without a context.

pub mod resources;
pub mod tools;

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::analytics::LearningAnalytics;
use crate::catalog::UserContext;
use crate::config::Config;
use crate::engine::CatalogEngine;
use crate::error::{CatalogError, Result};
use crate::progress::{provider_from_config, LearningProgress, ProgressTracker};

pub use resources::{list_resources, Resource, ResourceKind};
pub use tools::{tool_definitions, Tool, ToolRegistry, ToolResult};

/// The caller's identity, or `UserContextRequired` naming the operation
pub fn require_user<'a>(user: Option<&'a UserContext>, operation: &'static str) -> Result<&'a UserContext> {
    match user {
        Some(user) if !user.user_id.trim().is_empty() => Ok(user),
        _ => Err(CatalogError::UserContextRequired(operation)),
    }
}

/// Gateway statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub items: usize,
    pub resources: usize,
    pub tools: usize,
}

pub struct Gateway {
    catalog: Arc<CatalogEngine>,
    analytics: LearningAnalytics,
    tools: ToolRegistry,
    started_at: Instant,
}

impl Gateway {
    /// Fails when a declared tool has no handler or an invalid schema
    pub fn new(catalog: Arc<CatalogEngine>, provider: Arc<dyn LearningProgress>, timeout: Duration) -> anyhow::Result<Self> {
        let tracker = ProgressTracker::new(catalog.clone(), provider, timeout);
        let tools = ToolRegistry::new()?;
        info!("Gateway ready with {} tools", tools.len());
        Ok(Self {
            catalog,
            analytics: LearningAnalytics::new(tracker),
            tools,
            started_at: Instant::now(),
        })
    }

    /// Load the catalog snapshot and the progress provider named in `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let items = match &config.catalog.snapshot_path {
            Some(path) => CatalogEngine::load_snapshot(path)
                .with_context(|| format!("Failed to load catalog snapshot {}", path.display()))?,
            None => {
                warn!("No catalog snapshot configured, starting with an empty catalog");
                Vec::new()
            }
        };
        let catalog = if config.catalog.classify_on_ingest {
            CatalogEngine::ingest(items, config.urls.clone())?
        } else {
            CatalogEngine::new(
                Arc::new(crate::catalog::CatalogStore::from_snapshot(items)),
                config.urls.clone(),
            )
        };
        let provider = provider_from_config(&config.progress)?;
        Self::new(
            Arc::new(catalog),
            provider,
            Duration::from_secs(config.progress.timeout_secs),
        )
    }

    pub fn catalog(&self) -> &CatalogEngine {
        &self.catalog
    }

    pub fn analytics(&self) -> &LearningAnalytics {
        &self.analytics
    }

    pub fn list_tools(&self) -> &[Tool] {
        self.tools.definitions()
    }

    /// Validate arguments against the tool's schema and dispatch
    pub async fn call_tool(&self, name: &str, args: Value, user: Option<&UserContext>) -> Result<ToolResult> {
        let args = if args.is_null() { json!({}) } else { args };
        let handler = self.tools.prepare(name, &args)?;
        debug!(
            "Tool {} called by {}",
            name,
            user.map(|u| u.user_id.as_str()).unwrap_or("anonymous")
        );
        let result = handler(self, args, user).await;
        if let Err(e) = &result {
            debug!("Tool {} failed: {}", name, e);
        }
        result
    }

    pub fn status(&self) -> Result<GatewayStatus> {
        Ok(GatewayStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.started_at.elapsed().as_secs(),
            items: self.catalog.store().len()?,
            resources: ResourceKind::all().len(),
            tools: self.tools.len(),
        })
    }
}
