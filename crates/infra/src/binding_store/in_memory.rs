use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use anyhow::Context;

use bindgate_auth::Binding;
use bindgate_core::{BindingId, Entity};

use super::{BindingStore, StoreError};

/// In-memory binding store for tests/dev.
#[derive(Debug)]
pub struct InMemoryBindingStore {
    inner: RwLock<HashMap<BindingId, Arc<Binding>>>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_bindings(bindings: impl IntoIterator<Item = Binding>) -> Self {
        let map = bindings
            .into_iter()
            .map(|b| (b.id().clone(), Arc::new(b)))
            .collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    /// Load bindings from a JSON file containing an array of bindings.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bindings file {}", path.display()))?;
        let bindings: Vec<Binding> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse bindings file {}", path.display()))?;

        tracing::info!(count = bindings.len(), path = %path.display(), "loaded bindings");
        Ok(Self::from_bindings(bindings))
    }

    /// Insert or replace a binding. Handles already given out keep the old value.
    pub fn upsert(&self, binding: Binding) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(binding.id().clone(), Arc::new(binding));
        }
    }

    pub fn remove(&self, id: &BindingId) -> Option<Arc<Binding>> {
        self.inner.write().ok()?.remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBindingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingStore for InMemoryBindingStore {
    fn get(&self, id: &BindingId) -> Result<Arc<Binding>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("binding map lock poisoned"))?;
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
