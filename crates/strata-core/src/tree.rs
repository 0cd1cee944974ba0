//! Configuration trees and the deep merge engine
//!
//! A [`ConfigTree`] is an ordered mapping from option keys to JSON values.
//! Trees are combined with [`merge`], where the second argument takes
//! precedence at every node:
//!
//! - both sides objects: merged recursively, siblings are kept
//! - both sides arrays: the override array replaces the base array wholesale
//! - anything else (including an object meeting a scalar): the override wins
//!
//! Precedence is strictly positional. Folding `[a, b, c]` with [`merge_all`]
//! is the same as `merge(&merge(&a, &b), &c)`.

use crate::{Result, StrataError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered mapping of option names to values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree(Map<String, Value>);

impl ConfigTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(StrataError::config_error(format!(
                "expected a configuration object, found {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a nested object as a tree, if present and an object
    pub fn subtree(&self, key: &str) -> Option<ConfigTree> {
        match self.0.get(key) {
            Some(Value::Object(map)) => Some(Self(map.clone())),
            _ => None,
        }
    }

    /// Insert a value, keeping the key's position if it already exists
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a key, shifting later keys to preserve order
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ConfigTree {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ConfigTree {
    type Error = StrataError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Merge `override_tree` over `base`, producing a new tree
///
/// Neither input is modified. Keys that exist in both trees keep the position
/// they have in `base`; keys only present in `override_tree` are appended in
/// its order.
pub fn merge(base: &ConfigTree, override_tree: &ConfigTree) -> ConfigTree {
    ConfigTree(merge_maps(&base.0, &override_tree.0))
}

/// Fold trees left to right, later trees taking precedence
pub fn merge_all<'a, I>(trees: I) -> ConfigTree
where
    I: IntoIterator<Item = &'a ConfigTree>,
{
    trees
        .into_iter()
        .fold(ConfigTree::new(), |acc, tree| merge(&acc, tree))
}

fn merge_maps(base: &Map<String, Value>, top: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, value) in top {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(lower)), Value::Object(upper)) => {
                Value::Object(merge_maps(lower, upper))
            }
            // Arrays, scalars and type conflicts: the override replaces the base value
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    merged
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
