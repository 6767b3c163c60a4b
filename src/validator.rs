//! ViewType consistency validator and auto-fixer
//!
//! Scans the catalog for violations of the classification invariants and
//! repairs the ones that have a deterministic fix.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{CatalogItem, ViewType};
use crate::config::ViewUrlConfig;
use crate::engine::CatalogEngine;
use crate::error::Result;
use crate::viewtype::generate_direct_view_url;

/// The six invariant checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DirectViewMissingUrl,
    DirectViewHasMembership,
    MyLearningHasUrl,
    MyLearningInCart,
    CartMissingPrice,
    CartHasUrlOrLearning,
}

impl IssueKind {
    pub fn issue(&self) -> &'static str {
        match self {
            IssueKind::DirectViewMissingUrl => "Direct View item missing directViewUrl",
            IssueKind::DirectViewHasMembership => "Direct View item should not be in My Learning or Cart",
            IssueKind::MyLearningHasUrl => "My Learning item should not have directViewUrl",
            IssueKind::MyLearningInCart => "My Learning item should not be in cart",
            IssueKind::CartMissingPrice => "Cart item must have a valid price",
            IssueKind::CartHasUrlOrLearning => "Cart item should not have directViewUrl or be in My Learning",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            IssueKind::DirectViewMissingUrl => "Add a valid directViewUrl or change ViewType",
            IssueKind::DirectViewHasMembership => "Reset isInMyLearning and isInCart to false",
            IssueKind::MyLearningHasUrl => "Remove directViewUrl or change ViewType to Direct View",
            IssueKind::MyLearningInCart => "Reset isInCart to false",
            IssueKind::CartMissingPrice => "Set a price greater than 0 or change ViewType",
            IssueKind::CartHasUrlOrLearning => "Remove directViewUrl and reset isInMyLearning",
        }
    }

    /// Pricing needs a human decision
    pub fn auto_fixable(&self) -> bool {
        !matches!(self, IssueKind::CartMissingPrice)
    }
}

/// One invariant violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTypeIssue {
    pub item_id: String,
    pub title: String,
    pub issue: String,
    pub suggestion: String,
    #[serde(skip)]
    pub kind: IssueKind,
}

impl ViewTypeIssue {
    fn new(item: &CatalogItem, kind: IssueKind) -> Self {
        Self {
            item_id: item.id.clone(),
            title: item.title.clone(),
            issue: kind.issue().to_string(),
            suggestion: kind.suggestion().to_string(),
            kind,
        }
    }
}

/// Summary of a validation pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub checked: usize,
    pub fixable: usize,
    pub unfixable: usize,
    pub issues: Vec<ViewTypeIssue>,
}

fn has_url(item: &CatalogItem) -> bool {
    item.direct_view_url
        .as_deref()
        .map(|u| !u.trim().is_empty())
        .unwrap_or(false)
}

/// Every invariant violation of a single item
pub fn check_item(item: &CatalogItem) -> Vec<IssueKind> {
    let mut kinds = Vec::new();
    match item.view_type {
        ViewType::DirectView => {
            if !has_url(item) {
                kinds.push(IssueKind::DirectViewMissingUrl);
            }
            if item.is_in_my_learning || item.is_in_cart {
                kinds.push(IssueKind::DirectViewHasMembership);
            }
        }
        ViewType::MyLearning => {
            if item.direct_view_url.is_some() {
                kinds.push(IssueKind::MyLearningHasUrl);
            }
            if item.is_in_cart {
                kinds.push(IssueKind::MyLearningInCart);
            }
        }
        ViewType::Cart => {
            if !item.has_valid_price() {
                kinds.push(IssueKind::CartMissingPrice);
            }
            if item.direct_view_url.is_some() || item.is_in_my_learning {
                kinds.push(IssueKind::CartHasUrlOrLearning);
            }
        }
    }
    kinds
}

impl CatalogEngine {
    /// One issue record per invariant violation across the catalog
    pub fn validate_view_type_consistency(&self) -> Result<Vec<ViewTypeIssue>> {
        let issues: Vec<ViewTypeIssue> = self
            .store
            .snapshot()?
            .iter()
            .flat_map(|item| {
                check_item(item)
                    .into_iter()
                    .map(move |kind| ViewTypeIssue::new(item, kind))
            })
            .collect();
        if !issues.is_empty() {
            warn!("ViewType validation found {} issues", issues.len());
        }
        Ok(issues)
    }

    pub fn validation_report(&self) -> Result<ValidationReport> {
        let checked = self.store.len()?;
        let issues = self.validate_view_type_consistency()?;
        let fixable = issues.iter().filter(|i| i.kind.auto_fixable()).count();
        Ok(ValidationReport {
            checked,
            fixable,
            unfixable: issues.len() - fixable,
            issues,
        })
    }

    /// Repair every fixable issue; returns the number of items that received a fix.
    ///
    /// Issues are re-derived per item under the store's write lock, so a
    /// concurrent override is never answered with a fix for its old view type.
    pub fn auto_fix_view_type_issues(&self) -> Result<usize> {
        let urls = &self.urls;
        let fixed = self.store.update_all(|item| {
            for kind in check_item(item) {
                repair(item, kind, urls);
            }
        })?;

        if fixed > 0 {
            info!("Auto-fixed ViewType issues on {} items", fixed);
        }
        Ok(fixed)
    }
}

fn repair(item: &mut CatalogItem, kind: IssueKind, urls: &ViewUrlConfig) {
    match kind {
        IssueKind::DirectViewMissingUrl => {
            item.direct_view_url = Some(generate_direct_view_url(item, urls));
        }
        IssueKind::DirectViewHasMembership => {
            item.is_in_my_learning = false;
            item.is_in_cart = false;
        }
        IssueKind::MyLearningHasUrl => item.direct_view_url = None,
        IssueKind::MyLearningInCart => item.is_in_cart = false,
        IssueKind::CartHasUrlOrLearning => {
            item.direct_view_url = None;
            item.is_in_my_learning = false;
        }
        IssueKind::CartMissingPrice => {}
    }
}
