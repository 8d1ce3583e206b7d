//! Shared run context
//!
//! The context is a string-keyed map of JSON values shared by reference
//! between every hook and test body of a suite subtree.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Context visible to hooks and test bodies
///
/// Cloning a `RunContext` yields another handle to the same map, so writes
/// through one handle are observed by every other.
#[derive(Clone, Default)]
pub struct RunContext {
    values: Arc<Mutex<Map<String, Value>>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(Mutex::new(map)),
        }
    }

    /// Shallow-merge `parent` under `own`: keys in `own` win
    pub fn merged(parent: &RunContext, own: &Map<String, Value>) -> Self {
        let mut map = parent.snapshot();
        for (key, value) in own {
            map.insert(key.clone(), value.clone());
        }
        Self::from_map(map)
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Get a value and deserialize it into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Read-modify-write a single key under one lock acquisition
    pub fn update<F>(&self, key: impl Into<String>, f: F)
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let key = key.into();
        let mut values = self.lock();
        let next = f(values.get(&key));
        values.insert(key, next);
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether both handles point at the same map
    pub fn ptr_eq(&self, other: &RunContext) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RunContext").field(&*self.lock()).finish()
    }
}
