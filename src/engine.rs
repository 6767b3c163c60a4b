//! Catalog engine
//!
//! Owns the shared item store and the direct-view URL schemes. Search, the
//! ViewType rules and the consistency validator are implemented as methods on
//! [`CatalogEngine`] in their own modules.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::catalog::{CatalogItem, CatalogStore};
use crate::config::ViewUrlConfig;
use crate::error::Result;

pub struct CatalogEngine {
    pub(crate) store: Arc<CatalogStore>,
    pub(crate) urls: ViewUrlConfig,
}

impl CatalogEngine {
    /// Wrap an existing store; items are used as-is
    pub fn new(store: Arc<CatalogStore>, urls: ViewUrlConfig) -> Self {
        Self { store, urls }
    }

    /// Build from raw items without classification
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self::new(Arc::new(CatalogStore::from_snapshot(items)), ViewUrlConfig::default())
    }

    /// Ingest a snapshot from the authoring system, classifying every item by rule
    pub fn ingest(items: Vec<CatalogItem>, urls: ViewUrlConfig) -> Result<Self> {
        let engine = Self::new(Arc::new(CatalogStore::from_snapshot(items)), urls);
        let changed = engine.apply_business_rules_for_view_types()?;
        info!(
            "Ingested {} catalog items ({} reclassified)",
            engine.store.len()?,
            changed
        );
        Ok(engine)
    }

    /// Load a JSON array of catalog items from disk
    pub fn load_snapshot(path: &Path) -> Result<Vec<CatalogItem>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write every item back as a pretty JSON array
    pub fn save_snapshot(&self, path: &Path) -> Result<usize> {
        let items = self.store.snapshot()?;
        std::fs::write(path, serde_json::to_string_pretty(&items)?)?;
        info!("Wrote {} catalog items to {}", items.len(), path.display());
        Ok(items.len())
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn urls(&self) -> &ViewUrlConfig {
        &self.urls
    }

    /// Look up one item; `NotFound` when absent
    pub fn get_item(&self, id: &str) -> Result<CatalogItem> {
        self.store
            .get(id)?
            .ok_or_else(|| crate::error::CatalogError::NotFound(id.to_string()))
    }

    /// Insert or refresh one item pushed by the authoring system
    pub fn upsert_item(&self, item: CatalogItem, classify: bool) -> Result<CatalogItem> {
        let id = item.id.clone();
        let target = crate::viewtype::classify(&item);
        let reclassify = classify && target != item.view_type;
        self.store.upsert(item)?;
        if reclassify {
            return self.update_item_view_type(&id, target, None);
        }
        self.get_item(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ViewType;

    #[test]
    fn test_ingest_classifies_items() {
        let engine = CatalogEngine::ingest(
            vec![
                CatalogItem::new("v1", "Clip", 11),
                CatalogItem::new("m1", "Module", 8).with_price(49.0, "USD"),
                CatalogItem::new("m2", "Free module", 8),
            ],
            ViewUrlConfig::default(),
        )
        .unwrap();

        assert_eq!(engine.get_item("v1").unwrap().view_type, ViewType::DirectView);
        assert_eq!(engine.get_item("m1").unwrap().view_type, ViewType::Cart);
        assert_eq!(engine.get_item("m2").unwrap().view_type, ViewType::MyLearning);
    }

    #[test]
    fn test_load_snapshot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        let items = vec![CatalogItem::new("a", "Alpha", 8)];
        std::fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

        let loaded = CatalogEngine::load_snapshot(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[test]
    fn test_save_snapshot_roundtrips_triad() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let engine = CatalogEngine::ingest(vec![CatalogItem::new("v1", "Clip", 11)], ViewUrlConfig::default()).unwrap();
        assert_eq!(engine.save_snapshot(&path).unwrap(), 1);

        let reloaded = CatalogEngine::load_snapshot(&path).unwrap();
        assert_eq!(reloaded[0].view_type, ViewType::DirectView);
        assert_eq!(reloaded[0].direct_view_url.as_deref(), Some("https://video-player.example.com/v1"));
    }

    #[test]
    fn test_upsert_item_reclassifies() {
        let engine = CatalogEngine::from_items(vec![]);
        let item = engine
            .upsert_item(CatalogItem::new("d1", "Handbook", 14), true)
            .unwrap();
        assert_eq!(item.view_type, ViewType::DirectView);
        assert_eq!(
            item.direct_view_url.as_deref(),
            Some("https://document-viewer.example.com/d1")
        );
    }
}
