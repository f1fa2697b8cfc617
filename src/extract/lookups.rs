// src/extract/lookups.rs
//! Id → name maps shared between extraction steps.

use crate::constants::{UNKNOWN_DATAFLOW, UNKNOWN_DATASET};
use std::collections::HashMap;

/// An id → name map that answers a sentinel for unknown ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
    fallback: &'static str,
}

impl LookupTable {
    pub fn new(fallback: &'static str) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    /// Records `id`; empty ids are ignored.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        if !id.is_empty() {
            self.entries.insert(id, name.into());
        }
    }

    /// The name recorded for `id`, or the sentinel.
    pub fn resolve(&self, id: &str) -> &str {
        self.entries.get(id).map_or(self.fallback, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names collected while listing tenant datasets and dataflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookups {
    pub datasets: LookupTable,
    pub dataflows: LookupTable,
}

impl Default for Lookups {
    fn default() -> Self {
        Self {
            datasets: LookupTable::new(UNKNOWN_DATASET),
            dataflows: LookupTable::new(UNKNOWN_DATAFLOW),
        }
    }
}
