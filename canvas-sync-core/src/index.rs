//! Index of tracked todos by correlation key.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::correlation::{CorrelationKey, extract_key};
use crate::error::{SyncError, SyncResult};
use crate::todo::TodoResource;

#[derive(Debug, Default)]
pub struct TodoIndex {
    entries: BTreeMap<CorrelationKey, TodoResource>,
}

impl TodoIndex {
    /// Build the index from every todo tagged with `category`.
    ///
    /// A tagged todo whose description does not carry a correlation key is a data-integrity
    /// error: it was either hand-edited or not created by this tool.
    pub fn build(
        resources: Vec<TodoResource>,
        prefix: &str,
        category: &str,
    ) -> SyncResult<Self> {
        let mut index = TodoIndex::default();

        for resource in resources {
            if !resource.todo.has_category(category) {
                continue;
            }

            let description = resource.todo.description.as_deref().ok_or_else(|| {
                SyncError::DataIntegrity {
                    summary: resource.todo.summary.clone(),
                    reason: "missing description".to_string(),
                }
            })?;

            let key = extract_key(prefix, description).map_err(|reason| {
                SyncError::DataIntegrity {
                    summary: resource.todo.summary.clone(),
                    reason,
                }
            })?;

            debug!(%key, href = %resource.href, "Tracked todo");
            index.insert(key, resource);
        }

        Ok(index)
    }

    /// Insert a todo; the last insert wins on duplicate keys.
    pub fn insert(&mut self, key: CorrelationKey, resource: TodoResource) {
        if let Some(previous) = self.entries.insert(key, resource) {
            warn!(%key, href = %previous.href, "Duplicate correlation key, keeping the later todo");
        }
    }

    pub fn contains(&self, key: &CorrelationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &CorrelationKey) -> Option<&TodoResource> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &CorrelationKey) -> Option<&mut TodoResource> {
        self.entries.get_mut(key)
    }

    pub fn keys(&self) -> Vec<CorrelationKey> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
