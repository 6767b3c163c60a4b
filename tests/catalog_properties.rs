//! Integration tests for catalog behaviour:
//! - ViewType classification and actions
//! - Search pagination
//! - Consistency validation and auto-repair
//! - Serialized read-modify-write under concurrent callers

use catalog_engine::catalog::ItemStatus;
use catalog_engine::config::ViewUrlConfig;
use catalog_engine::search::SearchFilters;
use catalog_engine::validator::{check_item, IssueKind};
use catalog_engine::{CatalogEngine, CatalogItem, ViewType};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::thread;

fn catalog() -> Vec<CatalogItem> {
    let base = Utc::now() - Duration::days(60);
    (0..25)
        .map(|i| {
            let ct = [8, 11, 14, 28, 9, 689][i % 6];
            let mut item = CatalogItem::new(format!("item-{:02}", i), format!("Course {}", i), ct)
                .with_category(if i % 2 == 0 { "Technology" } else { "Leadership" })
                .with_rating(3.0 + (i % 5) as f64 * 0.5, 10)
                .with_created_at(base + Duration::days(i as i64));
            if i % 4 == 0 {
                item = item.with_price(19.0 + i as f64, "USD");
            }
            if i % 7 == 3 {
                item = item.with_status(ItemStatus::Draft);
            }
            item
        })
        .collect()
}

fn engine() -> CatalogEngine {
    CatalogEngine::ingest(catalog(), ViewUrlConfig::default()).unwrap()
}

// =====================================================================
// VIEWTYPE RULES
// =====================================================================

#[test]
fn test_video_without_price_becomes_direct_view() {
    let engine = CatalogEngine::ingest(vec![CatalogItem::new("vid-1", "Clip", 11)], ViewUrlConfig::default()).unwrap();
    let item = engine.get_item("vid-1").unwrap();
    assert_eq!(item.view_type, ViewType::DirectView);
    assert_eq!(item.direct_view_url.as_deref(), Some("https://video-player.example.com/vid-1"));
    assert!(!item.is_in_my_learning);
    assert!(!item.is_in_cart);
}

#[test]
fn test_paid_module_goes_to_cart_once() {
    let engine = CatalogEngine::ingest(
        vec![CatalogItem::new("m-49", "Paid", 8).with_price(49.0, "USD")],
        ViewUrlConfig::default(),
    )
    .unwrap();
    assert_eq!(engine.get_item("m-49").unwrap().view_type, ViewType::Cart);

    let first = engine.add_to_cart("m-49").unwrap();
    assert!(first.success);
    let second = engine.add_to_cart("m-49").unwrap();
    assert!(!second.success);
    assert_eq!(second.message, "already in cart");
}

#[test]
fn test_business_rules_are_idempotent() {
    let engine = CatalogEngine::from_items(catalog());
    let first = engine.apply_business_rules_for_view_types().unwrap();
    assert!(first > 0);
    assert_eq!(engine.apply_business_rules_for_view_types().unwrap(), 0);
}

#[test]
fn test_action_guard_never_mutates_cart_items() {
    let engine = engine();
    let cart_ids: Vec<String> = engine
        .store()
        .snapshot()
        .unwrap()
        .into_iter()
        .filter(|i| i.view_type == ViewType::Cart)
        .map(|i| i.id)
        .collect();
    assert!(!cart_ids.is_empty());

    for id in cart_ids {
        let before = engine.store().get_versioned(&id).unwrap().unwrap();
        let result = engine.add_to_my_learning(&id).unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Item cannot be added to My Learning (ViewType 3)");
        let after = engine.store().get_versioned(&id).unwrap().unwrap();
        assert_eq!(before.version, after.version);
        assert_eq!(before.item, after.item);
    }
}

#[test]
fn test_admin_override_resets_triad() {
    let engine = engine();
    let id = "item-01"; // video, free
    let item = engine.update_item_view_type(id, ViewType::MyLearning, None).unwrap();
    assert_eq!(item.view_type, ViewType::MyLearning);
    assert!(item.direct_view_url.is_none());

    let item = engine
        .update_item_view_type(id, ViewType::DirectView, Some("https://cdn.test/custom"))
        .unwrap();
    assert_eq!(item.direct_view_url.as_deref(), Some("https://cdn.test/custom"));
    assert_eq!(engine.get_direct_view_url(id).unwrap().url, "https://cdn.test/custom");
}

// =====================================================================
// SEARCH
// =====================================================================

#[test]
fn test_single_page_returns_whole_published_set() {
    let engine = engine();
    let published = engine
        .store()
        .snapshot()
        .unwrap()
        .into_iter()
        .filter(|i| i.is_published())
        .count();

    let probe = engine.search(&SearchFilters::default(), None).unwrap();
    assert_eq!(probe.total, published);
    assert!(probe.has_more);

    let filters = SearchFilters {
        limit: Some(probe.total),
        offset: Some(0),
        ..Default::default()
    };
    let page = engine.search(&filters, None).unwrap();
    assert_eq!(page.items.len(), published);
    assert_eq!(page.total, published);
    assert!(!page.has_more);
    assert!(page.items.iter().all(|i| i.is_published()));
}

#[test]
fn test_pages_do_not_overlap_with_equal_sort_keys() {
    let engine = engine();
    let page = |offset| SearchFilters {
        sort_by: Some("rating".to_string()),
        limit: Some(5),
        offset: Some(offset),
        ..Default::default()
    };
    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let results = engine.search(&page(offset), None).unwrap();
        seen.extend(results.items.into_iter().map(|i| i.id));
        if !results.has_more {
            break;
        }
        offset += 5;
    }
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
}

// =====================================================================
// VALIDATION
// =====================================================================

fn corrupt(engine: &CatalogEngine) {
    engine
        .store()
        .update_all(|item| match item.id.as_str() {
            "item-01" => item.direct_view_url = None,
            "item-02" => {
                item.is_in_cart = true;
                item.direct_view_url = Some("https://stale.test".to_string());
            }
            "item-04" => {
                item.price = None;
                item.is_in_my_learning = true;
            }
            "item-07" => item.is_in_my_learning = true,
            _ => {}
        })
        .unwrap();
}

#[test]
fn test_missing_url_is_reported_once() {
    let engine = CatalogEngine::ingest(vec![CatalogItem::new("doc", "Handbook", 14)], ViewUrlConfig::default()).unwrap();
    engine.store().update("doc", |item| item.direct_view_url = None).unwrap();

    let issues = engine.validate_view_type_consistency().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].item_id, "doc");
    assert_eq!(issues[0].suggestion, "Add a valid directViewUrl or change ViewType");
}

#[test]
fn test_auto_fix_restores_invariants_except_missing_price() {
    let engine = engine();
    corrupt(&engine);
    assert!(!engine.validate_view_type_consistency().unwrap().is_empty());

    let fixed = engine.auto_fix_view_type_issues().unwrap();
    assert!(fixed >= 3);

    for item in engine.store().snapshot().unwrap() {
        let remaining = check_item(&item);
        assert!(
            remaining.iter().all(|k| *k == IssueKind::CartMissingPrice),
            "{} still has {:?}",
            item.id,
            remaining
        );
    }
    let issues = engine.validate_view_type_consistency().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].item_id, "item-04");
    assert_eq!(engine.auto_fix_view_type_issues().unwrap(), 0);
}

// =====================================================================
// CONCURRENCY
// =====================================================================

#[test]
fn test_racing_add_to_cart_has_one_winner() {
    for round in 0..50 {
        let id = format!("race-{}", round);
        let engine = Arc::new(
            CatalogEngine::ingest(
                vec![CatalogItem::new(id.clone(), "Race", 8).with_price(10.0, "EUR")],
                ViewUrlConfig::default(),
            )
            .unwrap(),
        );

        let start = engine.store().get_versioned(&id).unwrap().unwrap().version;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = engine.clone();
                let id = id.clone();
                thread::spawn(move || engine.add_to_cart(&id).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.success).count(), 1);
        assert!(results.iter().any(|r| r.message == "already in cart"));
        assert_eq!(engine.store().get_versioned(&id).unwrap().unwrap().version, start + 1);
    }
}

#[test]
fn test_auto_fix_racing_override_keeps_invariants() {
    for round in 0..200 {
        let id = format!("fix-{}", round);
        let engine = Arc::new(CatalogEngine::from_items(vec![
            CatalogItem::new(id.clone(), "Clip", 11).with_view_type(ViewType::DirectView),
        ]));

        let fixer = {
            let engine = engine.clone();
            thread::spawn(move || engine.auto_fix_view_type_issues().unwrap())
        };
        let admin = {
            let engine = engine.clone();
            let id = id.clone();
            thread::spawn(move || engine.update_item_view_type(&id, ViewType::MyLearning, None).unwrap())
        };
        let fixed = fixer.join().unwrap();
        admin.join().unwrap();

        let item = engine.get_item(&id).unwrap();
        assert_eq!(item.view_type, ViewType::MyLearning);
        assert!(item.direct_view_url.is_none(), "round {}: stale url {:?}", round, item.direct_view_url);
        assert!(check_item(&item).is_empty());
        assert!(fixed <= 1);
    }
}
