//! Run-scoped state shared by every check and remediation.
//!
//! [`SharedState`] holds environment variables contributed by checks and a
//! per-check namespaced bag of JSON values. It is created once per run and
//! only grows: there is no removal API. It is not synchronized; the runner
//! executes checks sequentially, so a single `&mut` borrow is always enough.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Environment variables plus per-check contributed data.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    env: HashMap<String, String>,
    data: BTreeMap<String, BTreeMap<String, Value>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable for commands launched later in the run.
    ///
    /// Later writes overwrite earlier ones.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// All contributed environment variables.
    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Store a value under `check_id`'s namespace.
    ///
    /// Values that fail to serialize are logged and stored as `null`.
    pub fn contribute(&mut self, check_id: &str, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::warn!("Dropping state '{}' from {}: {}", key, check_id, e);
            Value::Null
        });
        tracing::debug!("State contributed by {}", check_id);
        self.data
            .entry(check_id.to_lowercase())
            .or_default()
            .insert(key, value);
    }

    /// Read a value from one check's namespace.
    pub fn try_get_state<T: DeserializeOwned>(&self, check_id: &str, key: &str) -> Option<T> {
        self.data
            .get(&check_id.to_lowercase())
            .and_then(|bag| bag.get(key))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Collect `key` from every namespace that holds it, ordered by check id.
    pub fn try_get_state_from_all<T: DeserializeOwned>(&self, key: &str) -> Vec<(String, T)> {
        self.data
            .iter()
            .filter_map(|(id, bag)| {
                let value = bag.get(key)?;
                let typed = serde_json::from_value(value.clone()).ok()?;
                Some((id.clone(), typed))
            })
            .collect()
    }

    /// Whether `check_id` contributed anything.
    pub fn has_namespace(&self, check_id: &str) -> bool {
        self.data.contains_key(&check_id.to_lowercase())
    }
}
