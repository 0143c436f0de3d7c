//! Reactive property store.
//!
//! The store holds the non-child entries of a component's construction
//! bag. All writes flow through [`Component::set_props`] so the
//! before/after snapshots reach the update gate; the store itself only
//! knows how to snapshot, merge, and hand values out. It deliberately
//! has no removal API - property deletion is rejected at the component
//! boundary with `InvalidOperation`.
//!
//! Reactivity is shallow: replacing a top-level value is observed,
//! mutating inside a nested `Data` structure is not.
//!
//! [`Component::set_props`]: crate::component::Component::set_props

use serde_json::Value;

use crate::types::{EventMap, PropMap, PropValue, TemplateContext};

/// Reserved key: document event listeners, rewired on every render.
pub const EVENTS_KEY: &str = "events";

/// Reserved key: space-separated class tokens, applied on every render.
pub const CLASSES_KEY: &str = "classes";

/// The reactive property mapping of one component instance.
#[derive(Default)]
pub struct PropStore {
    values: PropMap,
}

impl PropStore {
    pub fn new(values: PropMap) -> Self {
        Self { values }
    }

    /// Read a property.
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shallow copy of the current mapping - the unit the update gate
    /// compares. Handler-valued entries stay shared.
    pub fn snapshot(&self) -> PropMap {
        self.values.clone()
    }

    /// Merge a partial mapping in, overwriting existing keys. One merge
    /// is one update, however many keys it carries; the component emits
    /// `updated` once around it.
    pub(crate) fn merge(&mut self, partial: PropMap) {
        for (key, value) in partial {
            self.values.insert(key, value);
        }
    }

    /// Invoke a function-valued property with this store as its
    /// context. `None` when the key is absent or not a function.
    pub fn call(&self, key: &str) -> Option<Value> {
        match self.values.get(key)? {
            PropValue::Func(callback) => Some(callback(self)),
            _ => None,
        }
    }

    // =========================================================================
    // Reserved Keys
    // =========================================================================

    /// The `events` listener map, when present.
    pub fn events(&self) -> Option<&EventMap> {
        match self.values.get(EVENTS_KEY)? {
            PropValue::Events(map) => Some(map),
            _ => None,
        }
    }

    /// The `classes` token string, when present.
    pub fn classes(&self) -> Option<&str> {
        self.values.get(CLASSES_KEY)?.as_str()
    }

    /// The template-visible slice of the store: `Data` entries only.
    /// Functions and listeners never reach the template.
    pub fn data_context(&self) -> TemplateContext {
        self.values
            .iter()
            .filter_map(|(key, value)| {
                value.as_data().map(|data| (key.clone(), data.clone()))
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
