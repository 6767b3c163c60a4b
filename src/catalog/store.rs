//! In-memory catalog store
//!
//! Items live in an insertion-ordered arena with an id index. Every write bumps
//! a per-item version counter. All read-modify-write sequences run under a
//! single write-lock acquisition, so concurrent mutations of the same item are
//! serialized.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::item::CatalogItem;
use crate::error::{CatalogError, Result};

/// A stored item together with its write counter
#[derive(Debug, Clone, Serialize)]
pub struct Versioned {
    pub version: u64,
    pub item: CatalogItem,
}

#[derive(Default)]
struct Slots {
    entries: Vec<Versioned>,
    index: HashMap<String, usize>,
}

impl Slots {
    fn upsert(&mut self, item: CatalogItem) -> u64 {
        if let Some(&idx) = self.index.get(&item.id) {
            let entry = &mut self.entries[idx];
            entry.version += 1;
            entry.item = item;
            return entry.version;
        }
        self.index.insert(item.id.clone(), self.entries.len());
        self.entries.push(Versioned { version: 1, item });
        1
    }
}

/// Shared catalog collection
#[derive(Default)]
pub struct CatalogStore {
    slots: RwLock<Slots>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot as-is; a repeated id replaces the earlier entry
    pub fn from_snapshot(items: Vec<CatalogItem>) -> Self {
        let mut slots = Slots::default();
        for item in items {
            slots.upsert(item);
        }
        Self { slots: RwLock::new(slots) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Slots>> {
        self.slots.read().map_err(|_| CatalogError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Slots>> {
        self.slots.write().map_err(|_| CatalogError::LockPoisoned("write"))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, id: &str) -> Result<Option<CatalogItem>> {
        Ok(self.get_versioned(id)?.map(|v| v.item))
    }

    pub fn get_versioned(&self, id: &str) -> Result<Option<Versioned>> {
        let slots = self.read()?;
        Ok(slots.index.get(id).map(|&idx| slots.entries[idx].clone()))
    }

    /// Consistent copy of every item, in insertion order
    pub fn snapshot(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.read()?.entries.iter().map(|v| v.item.clone()).collect())
    }

    /// Insert or replace an item; returns its new version
    pub fn upsert(&self, item: CatalogItem) -> Result<u64> {
        Ok(self.write()?.upsert(item))
    }

    /// Read-modify-write one item under the write lock.
    ///
    /// The version only moves when the closure actually changed the item.
    pub fn update<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut CatalogItem) -> R,
    {
        let mut slots = self.write()?;
        let idx = *slots
            .index
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let entry = &mut slots.entries[idx];
        let before = entry.item.clone();
        let out = f(&mut entry.item);
        if entry.item != before {
            entry.version += 1;
            debug!("Item {} updated to version {}", id, entry.version);
        }
        Ok(out)
    }

    /// Apply `f` to every item under one write lock; returns how many items changed
    pub fn update_all<F>(&self, mut f: F) -> Result<usize>
    where
        F: FnMut(&mut CatalogItem),
    {
        let mut slots = self.write()?;
        let mut changed = 0;
        for entry in slots.entries.iter_mut() {
            let before = entry.item.clone();
            f(&mut entry.item);
            if entry.item != before {
                entry.version += 1;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Optimistic replace: fails when the stored version is not `expected_version`
    pub fn replace(&self, id: &str, expected_version: u64, item: CatalogItem) -> Result<u64> {
        if item.id != id {
            return Err(CatalogError::InvalidArguments(format!(
                "replacement item id {} does not match {}",
                item.id, id
            )));
        }
        let mut slots = self.write()?;
        let idx = *slots
            .index
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let entry = &mut slots.entries[idx];
        if entry.version != expected_version {
            return Err(CatalogError::ConcurrentWrite {
                id: id.to_string(),
                expected: expected_version,
                actual: entry.version,
            });
        }
        entry.item = item;
        entry.version += 1;
        Ok(entry.version)
    }
}
