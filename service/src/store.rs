//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Shared forecast cache
//!
//! The store is a write-once map from city to record. Entries live for the
//! lifetime of the store: there is no expiry, no eviction and no update.

use crate::{ForecastRecord, QueryKey};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Concurrent write-once forecast cache
///
/// Cloning a `RecordStore` yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<DashMap<QueryKey, Arc<ForecastRecord>>>,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for a city
    pub fn get(&self, city: &str) -> Option<Arc<ForecastRecord>> {
        self.records.get(city).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert a record unless one is already present
    ///
    /// Returns the record now held for `key`. When two handlers race to fill
    /// the same key, the first insert is kept and both callers receive it.
    pub fn insert(&self, key: QueryKey, record: ForecastRecord) -> Arc<ForecastRecord> {
        match self.records.entry(key) {
            Entry::Occupied(entry) => {
                tracing::debug!(city = %entry.key(), "Record already cached, keeping existing");
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(record)).value()),
        }
    }

    /// Check if a city is cached
    pub fn contains(&self, city: &str) -> bool {
        self.records.contains_key(city)
    }

    /// Number of cached cities
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of the cached keys, in no particular order
    pub fn keys(&self) -> Vec<QueryKey> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }
}
