//! Id extraction from undocumented response payloads.
//!
//! The service's response schema is not published and changes without notice, so
//! notebook and source ids are recognised by shape rather than by position. The
//! heuristics live behind [`IdExtractor`] so they can be hardened or replaced without
//! touching the registration pipeline.

use serde_json::Value;

use crate::types::{ContainerId, ItemId};

/// Locates notebook and source ids in decoded payloads
pub trait IdExtractor: Send + Sync {
    /// Find the id of a newly created notebook in a create-container payload
    fn container_id(&self, payload: &Value) -> Option<ContainerId>;

    /// Find every source id in a get-container payload, in first-seen order
    fn item_ids(&self, payload: &Value, container: &ContainerId) -> Vec<ItemId>;
}

/// Shape-based id recognition
///
/// - Notebook id: slot `[2]` when it holds a non-empty string, otherwise the first
///   top-level string longer than `container_min_len` without whitespace.
/// - Source ids: every string nested anywhere in arrays that is longer than
///   `item_min_len`, has no whitespace, is not a URL and is not the notebook id.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    /// Strings must be strictly longer than this to count as a notebook id
    pub container_min_len: usize,
    /// Strings must be strictly longer than this to count as a source id
    pub item_min_len: usize,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self {
            container_min_len: 10,
            item_min_len: 20,
        }
    }
}

impl HeuristicExtractor {
    fn looks_like_id(s: &str, min_len: usize) -> bool {
        s.chars().count() > min_len && !s.chars().any(char::is_whitespace)
    }

    fn collect_item_ids(&self, value: &Value, container: &str, found: &mut Vec<ItemId>) {
        let Value::Array(elements) = value else {
            return;
        };
        for element in elements {
            if let Value::String(s) = element {
                if Self::looks_like_id(s, self.item_min_len)
                    && !s.starts_with("http")
                    && s != container
                    && !found.iter().any(|id| id.as_str() == s)
                {
                    found.push(ItemId::new(s.clone()));
                }
            }
            self.collect_item_ids(element, container, found);
        }
    }
}

impl IdExtractor for HeuristicExtractor {
    fn container_id(&self, payload: &Value) -> Option<ContainerId> {
        if let Some(id) = payload.get(2).and_then(Value::as_str)
            && !id.is_empty()
        {
            return Some(ContainerId::new(id));
        }

        payload
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .find(|s| Self::looks_like_id(s, self.container_min_len))
            .map(ContainerId::new)
    }

    fn item_ids(&self, payload: &Value, container: &ContainerId) -> Vec<ItemId> {
        let mut found = Vec::new();
        self.collect_item_ids(payload, container.as_str(), &mut found);
        found
    }
}
