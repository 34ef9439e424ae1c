use std::fmt::Debug;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// The persisted token record. The provider's schema is treated as an opaque
/// mergeable mapping so fields we never look at still survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRecord {
    fields: Map<String, Value>,
}

impl TokenRecord {
    /// Wrap a provider response body. Returns `None` for anything that is not
    /// a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(TokenRecord { fields }),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.fields.get("access_token").and_then(Value::as_str)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.fields.get("refresh_token").and_then(Value::as_str)
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.fields.get("expires_in").and_then(Value::as_u64)
    }

    /// Merge a provider response into this record: keys in `other` overwrite,
    /// keys absent from `other` keep their stored value. A renewal that omits
    /// `refresh_token` therefore never drops the stored one.
    pub fn merge(&mut self, other: &TokenRecord) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, Value)]) -> Self {
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.insert((*key).to_string(), value.clone());
        }
        TokenRecord { fields }
    }
}

/// Storage seam for the token record. Every `load` must reflect the current
/// persisted state; implementations do not cache across calls.
pub trait TokenStore: Send + Sync + Debug {
    fn load(&self) -> Result<TokenRecord, StoreError>;
    fn save(&self, record: &TokenRecord) -> Result<(), StoreError>;
}

/// Single-JSON-file store. Saves write to a sibling temp file and rename so a
/// load within the same run never observes a partial write.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        FileTokenStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<TokenRecord, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.display().to_string()));
        }
        let content = read_to_string(&self.path)?;
        let record = serde_json::from_str::<TokenRecord>(&content)?;
        Ok(record)
    }

    fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(record)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serialized)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        MemoryTokenStore::default()
    }

    pub fn with_record(record: TokenRecord) -> Self {
        MemoryTokenStore {
            record: Mutex::new(Some(record)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<TokenRecord, StoreError> {
        self.record
            .lock()
            .expect("token store lock")
            .clone()
            .ok_or_else(|| StoreError::NotFound("<memory>".to_string()))
    }

    fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
        *self.record.lock().expect("token store lock") = Some(record.clone());
        Ok(())
    }
}
