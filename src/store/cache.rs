//! Read-through cache for reference data.
//!
//! Every key moves through `Absent -> Loading -> Cached`. The lookup and the
//! transition to `Loading` happen under one lock, so a key is only ever
//! loaded by one caller at a time; concurrent callers get
//! [`StoreError::LoadInProgress`] instead of waiting. Failed loads go back to
//! `Absent`. Nothing is ever evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    Cache,
    File,
}

impl CacheOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOrigin::Cache => "cache",
            CacheOrigin::File => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub document: Arc<Value>,
    pub origin: CacheOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Absent,
    Loading,
    Cached,
}

#[derive(Debug)]
enum Slot {
    Loading,
    Cached(Arc<Value>),
}

#[derive(Debug, Default)]
pub struct ReferenceCache {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Clears a `Loading` mark unless disarmed, including when the loader panics.
struct LoadingMark<'a> {
    cache: &'a ReferenceCache,
    key: &'a str,
    armed: bool,
}

impl Drop for LoadingMark<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut slots = self.cache.slots();
            if matches!(slots.get(self.key), Some(Slot::Loading)) {
                slots.remove(self.key);
            }
        }
    }
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_or_load<F>(&self, key: &str, loader: F) -> Result<CachedDocument>
    where
        F: FnOnce() -> Result<Value>,
    {
        {
            let mut slots = self.slots();
            match slots.get(key) {
                Some(Slot::Cached(document)) => {
                    log::debug!("reference data '{}' served from cache", key);
                    return Ok(CachedDocument {
                        document: Arc::clone(document),
                        origin: CacheOrigin::Cache,
                    });
                }
                Some(Slot::Loading) => {
                    log::debug!("reference data '{}' is already loading", key);
                    return Err(StoreError::LoadInProgress(key.to_string()));
                }
                None => {
                    slots.insert(key.to_string(), Slot::Loading);
                }
            }
        }

        let mut mark = LoadingMark {
            cache: self,
            key,
            armed: true,
        };
        log::debug!("reference data '{}' not cached, loading", key);
        let document = Arc::new(loader()?);
        self.slots()
            .insert(key.to_string(), Slot::Cached(Arc::clone(&document)));
        mark.armed = false;

        Ok(CachedDocument {
            document,
            origin: CacheOrigin::File,
        })
    }

    pub fn state(&self, key: &str) -> CacheState {
        match self.slots().get(key) {
            None => CacheState::Absent,
            Some(Slot::Loading) => CacheState::Loading,
            Some(Slot::Cached(_)) => CacheState::Cached,
        }
    }

    pub fn cached_len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Cached(_)))
            .count()
    }
}
