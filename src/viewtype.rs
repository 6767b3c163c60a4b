//! ViewType rule engine
//!
//! Classifies catalog items into Direct View / My Learning / Cart, applies the
//! per-type defaults and guards the learning-list and cart membership toggles.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{content_types, CatalogItem, ViewType};
use crate::config::ViewUrlConfig;
use crate::engine::CatalogEngine;
use crate::error::{CatalogError, Result};

/// Business rule: direct-view content types open in a viewer, priced items go
/// to the cart, everything else is enrolled.
pub fn classify(item: &CatalogItem) -> ViewType {
    if content_types::is_direct_view(item.content_type_id) {
        ViewType::DirectView
    } else if item.has_valid_price() {
        ViewType::Cart
    } else {
        ViewType::MyLearning
    }
}

/// Generated viewer URL for a Direct View item, by content type
pub fn generate_direct_view_url(item: &CatalogItem, urls: &ViewUrlConfig) -> String {
    let template = match item.content_type_id {
        content_types::VIDEO => &urls.video,
        content_types::WEBPAGE => &urls.webpage,
        content_types::DOCUMENT => &urls.document,
        _ => &urls.generic,
    };
    template.replace("{id}", &item.id)
}

/// Reset the classification triad, then apply the defaults of `view_type`
pub fn apply_view_type(
    item: &mut CatalogItem,
    view_type: ViewType,
    custom_url: Option<&str>,
    urls: &ViewUrlConfig,
) {
    item.direct_view_url = None;
    item.is_in_my_learning = false;
    item.is_in_cart = false;
    item.view_type = view_type;

    match view_type {
        ViewType::DirectView => {
            let url = custom_url
                .map(str::to_string)
                .unwrap_or_else(|| generate_direct_view_url(item, urls));
            item.direct_view_url = Some(url);
        }
        ViewType::MyLearning => {}
        ViewType::Cart => {
            if !item.has_valid_price() {
                warn!("Cart item {} has no valid price", item.id);
            }
        }
    }
}

/// Outcome of a membership action; `success: false` is an expected condition, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectViewLink {
    pub url: String,
    pub open_in_new_tab: bool,
}

/// Distribution of items over view types and membership flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTypeStats {
    pub total: usize,
    pub direct_view: usize,
    pub my_learning: usize,
    pub cart: usize,
    pub in_my_learning: usize,
    pub in_cart: usize,
}

impl CatalogEngine {
    /// Admin override: reset the triad and apply the defaults of `view_type`
    pub fn update_item_view_type(
        &self,
        id: &str,
        view_type: ViewType,
        custom_url: Option<&str>,
    ) -> Result<CatalogItem> {
        let urls = &self.urls;
        let item = self.store.update(id, |item| {
            apply_view_type(item, view_type, custom_url, urls);
            item.clone()
        })?;
        info!("Item {} set to ViewType {} ({})", id, view_type, view_type.label());
        Ok(item)
    }

    /// Reclassify every item by rule; returns how many items changed view type
    pub fn apply_business_rules_for_view_types(&self) -> Result<usize> {
        let urls = &self.urls;
        let changed = self.store.update_all(|item| {
            let target = classify(item);
            if target != item.view_type {
                apply_view_type(item, target, None, urls);
            }
        })?;
        if changed > 0 {
            info!("Business rules reclassified {} items", changed);
        }
        Ok(changed)
    }

    pub fn add_to_my_learning(&self, id: &str) -> Result<ActionResult> {
        let result = self.store.update(id, |item| {
            if item.view_type != ViewType::MyLearning {
                return ActionResult::rejected(format!(
                    "Item cannot be added to My Learning (ViewType {})",
                    item.view_type
                ));
            }
            if item.is_in_my_learning {
                return ActionResult::rejected("already in my learning");
            }
            item.is_in_my_learning = true;
            ActionResult::ok("Added to My Learning")
        })?;
        log_action("add_to_my_learning", id, &result);
        Ok(result)
    }

    pub fn add_to_cart(&self, id: &str) -> Result<ActionResult> {
        let result = self.store.update(id, |item| {
            if item.view_type != ViewType::Cart {
                return ActionResult::rejected(format!(
                    "Item cannot be added to cart (ViewType {})",
                    item.view_type
                ));
            }
            if !item.has_valid_price() {
                return ActionResult::rejected("Cart item must have a valid price");
            }
            if item.is_in_cart {
                return ActionResult::rejected("already in cart");
            }
            item.is_in_cart = true;
            ActionResult::ok("Added to cart")
        })?;
        log_action("add_to_cart", id, &result);
        Ok(result)
    }

    pub fn remove_from_my_learning(&self, id: &str) -> Result<ActionResult> {
        let result = self.store.update(id, |item| {
            if item.view_type != ViewType::MyLearning {
                return ActionResult::rejected(format!(
                    "Item cannot be removed from My Learning (ViewType {})",
                    item.view_type
                ));
            }
            if !item.is_in_my_learning {
                return ActionResult::rejected("not in my learning");
            }
            item.is_in_my_learning = false;
            ActionResult::ok("Removed from My Learning")
        })?;
        log_action("remove_from_my_learning", id, &result);
        Ok(result)
    }

    pub fn remove_from_cart(&self, id: &str) -> Result<ActionResult> {
        let result = self.store.update(id, |item| {
            if item.view_type != ViewType::Cart {
                return ActionResult::rejected(format!(
                    "Item cannot be removed from cart (ViewType {})",
                    item.view_type
                ));
            }
            if !item.is_in_cart {
                return ActionResult::rejected("not in cart");
            }
            item.is_in_cart = false;
            ActionResult::ok("Removed from cart")
        })?;
        log_action("remove_from_cart", id, &result);
        Ok(result)
    }

    /// Viewer link for a Direct View item
    pub fn get_direct_view_url(&self, id: &str) -> Result<DirectViewLink> {
        let item = self.get_item(id)?;
        if item.view_type != ViewType::DirectView {
            return Err(CatalogError::NotDirectView {
                id: item.id,
                view_type: item.view_type.as_u8(),
            });
        }
        let url = item.direct_view_url.ok_or_else(|| {
            CatalogError::InvalidArguments(format!("Direct View item {} has no directViewUrl", id))
        })?;
        Ok(DirectViewLink { url, open_in_new_tab: true })
    }

    /// Items currently flagged as in My Learning
    pub fn my_learning_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self
            .store
            .snapshot()?
            .into_iter()
            .filter(|i| i.view_type == ViewType::MyLearning && i.is_in_my_learning)
            .collect())
    }

    /// Items currently in the cart
    pub fn cart_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self
            .store
            .snapshot()?
            .into_iter()
            .filter(|i| i.view_type == ViewType::Cart && i.is_in_cart)
            .collect())
    }

    pub fn view_type_stats(&self) -> Result<ViewTypeStats> {
        let mut stats = ViewTypeStats::default();
        for item in self.store.snapshot()? {
            stats.total += 1;
            match item.view_type {
                ViewType::DirectView => stats.direct_view += 1,
                ViewType::MyLearning => stats.my_learning += 1,
                ViewType::Cart => stats.cart += 1,
            }
            if item.is_in_my_learning {
                stats.in_my_learning += 1;
            }
            if item.is_in_cart {
                stats.in_cart += 1;
            }
        }
        Ok(stats)
    }
}

fn log_action(action: &str, id: &str, result: &ActionResult) {
    if result.success {
        info!("{} {}: {}", action, id, result.message);
    } else {
        info!("{} {} rejected: {}", action, id, result.message);
    }
}
