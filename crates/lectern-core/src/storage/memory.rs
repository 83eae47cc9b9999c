//! In-memory item store
//!
//! Same contract as the SQLite store, without durability.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{check_successor, ItemStore, Result, StorageError};
use crate::item::{Item, ItemFilter, ItemId, NewItem, RatingEvent, MAX_PRIORITY};

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<ItemId, Item>,
    events: Vec<RatingEvent>,
    next_id: ItemId,
}

/// [`ItemStore`] backed by a `BTreeMap` behind a mutex
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    inner: Mutex<Inner>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing items (ids are kept)
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let items: BTreeMap<ItemId, Item> = items.into_iter().map(|item| (item.id, item)).collect();
        let next_id = items.keys().next_back().copied().unwrap_or(0);
        Self {
            inner: Mutex::new(Inner {
                items,
                events: Vec::new(),
                next_id,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Init("Store lock poisoned".into()))
    }

    fn update<F>(&self, id: ItemId, apply: F) -> Result<Item>
    where
        F: FnOnce(&mut Item),
    {
        let mut inner = self.lock()?;
        let item = inner
            .items
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        apply(item);
        Ok(item.clone())
    }
}

impl ItemStore for InMemoryItemStore {
    fn load_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let inner = self.lock()?;
        let matching = inner.items.values().filter(|item| filter.matches(item)).cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn load_item(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    fn save_item_and_log(&self, item: &Item, event: &RatingEvent) -> Result<()> {
        let mut inner = self.lock()?;
        let stored = inner
            .items
            .get(&item.id)
            .ok_or_else(|| StorageError::NotFound(item.id.to_string()))?;
        check_successor(stored, item, event)?;
        if inner.events.iter().any(|existing| existing.id == event.id) {
            return Err(StorageError::Validation(format!(
                "rating event {} already recorded",
                event.id
            )));
        }

        inner.items.insert(item.id, item.clone());
        inner.events.push(event.clone());
        Ok(())
    }

    fn insert_item(&self, input: NewItem, created_at: DateTime<Utc>) -> Result<Item> {
        if input.priority > MAX_PRIORITY {
            return Err(StorageError::Validation(format!(
                "priority {} exceeds {}",
                input.priority, MAX_PRIORITY
            )));
        }

        let mut inner = self.lock()?;
        inner.next_id += 1;
        let mut item = Item::new(inner.next_id, input.title, created_at);
        item.kind = input.kind;
        item.priority = input.priority;
        item.category_id = input.category_id;
        item.favorite = input.favorite;

        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn set_priority(&self, id: ItemId, priority: u8) -> Result<Item> {
        if priority > MAX_PRIORITY {
            return Err(StorageError::Validation(format!(
                "priority {} exceeds {}",
                priority, MAX_PRIORITY
            )));
        }
        self.update(id, |item| item.priority = priority)
    }

    fn reschedule(&self, id: ItemId, next_due_at: DateTime<Utc>) -> Result<Item> {
        self.update(id, |item| item.next_due_at = Some(next_due_at))
    }

    fn rating_events(&self, item_id: Option<ItemId>) -> Result<Vec<RatingEvent>> {
        let inner = self.lock()?;
        let mut events: Vec<RatingEvent> = inner
            .events
            .iter()
            .filter(|event| item_id.is_none_or(|id| event.item_id == id))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }
}
