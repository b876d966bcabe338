//! Layered provider configuration.
//!
//! A provider ships a default document; the user document is deep merged over
//! it once at construction. Lookups use dotted paths (`gcs.bucket`) and never
//! mutate the merged tree.

use crate::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: Value,
}

impl ConfigStore {
    pub fn new(defaults: Value, user: Value) -> Self {
        let mut root = defaults;
        merge(&mut root, user);
        Self { root }
    }

    /// Raw lookup. `null` leaves are returned as-is.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |value, segment| value.as_object()?.get(segment))
    }

    /// Typed lookup. Absent and `null` both yield `None`.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.lookup(path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|err| Error::invalid_config(path, err.to_string())),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<T> {
        Ok(self.get(path)?.unwrap_or(default))
    }

    pub fn require<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path)?
            .ok_or_else(|| Error::MissingConfigKey(path.to_string()))
    }

    /// Fails on the first path, in the given order, that is absent or `null`.
    pub fn validate_required_keys(&self, paths: &[&str]) -> Result<()> {
        for path in paths {
            if matches!(self.lookup(path), None | Some(Value::Null)) {
                return Err(Error::MissingConfigKey(path.to_string()));
            }
        }
        Ok(())
    }
}

fn merge(base: &mut Value, over: Value) {
    match (base, over) {
        (Value::Object(base), Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, over) => *base = over,
    }
}
