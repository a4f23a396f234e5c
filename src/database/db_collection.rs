use indexmap::IndexMap;
use serde_json::Value;

use crate::database::{DbConfig, IdManager, StoreError};

/// Documents of one entity, in insertion order, keyed by id.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    rows: IndexMap<String, Value>,
    id_manager: IdManager,
    config: DbConfig,
}

impl MemoryCollection {
    pub fn new(name: &str, config: DbConfig) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            rows: IndexMap::new(),
            id_manager: IdManager::new(config.id_type),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> impl Iterator<Item = &Value> {
        self.rows.values()
    }

    pub fn get_all(&self) -> Vec<Value> {
        self.rows.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.rows.get(id)
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Stores `item`, keeping its id when it has one and generating one
    /// otherwise. Returns the stored document.
    pub fn add(&mut self, item: Value) -> Result<Value, StoreError> {
        let Value::Object(mut map) = item else {
            return Err(StoreError::NotAnObject { collection: self.name.clone() });
        };

        let id = match map.get(&self.config.id_key) {
            Some(id) if !id.is_null() => {
                self.id_manager.observe(id);
                id.clone()
            }
            _ => {
                let id = self.id_manager.next().ok_or_else(|| StoreError::MissingId {
                    collection: self.name.clone(),
                    key: self.config.id_key.clone(),
                })?;
                map.insert(self.config.id_key.clone(), id.clone());
                id
            }
        };

        let key = match &id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let item = Value::Object(map);
        self.rows.insert(key, item.clone());
        Ok(item)
    }

    pub fn add_batch(&mut self, items: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        items.into_iter().map(|item| self.add(item)).collect()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.rows.len();
        self.rows.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    pub fn test_add_generates_and_keeps_ids() {
        let mut coll = MemoryCollection::new("Member", DbConfig::int("id"));
        let first = coll.add(json!({ "username": "member1", "id": null })).unwrap();
        assert_eq!(first["id"], json!(1));

        coll.add(json!({ "username": "member2", "id": 7 })).unwrap();
        let third = coll.add(json!({ "username": "member3" })).unwrap();
        assert_eq!(third["id"], json!(8));

        assert_eq!(coll.name(), "member");
        assert_eq!(coll.count(), 3);
        assert_eq!(coll.get("7").unwrap()["username"], json!("member2"));
    }

    #[test]
    pub fn test_rejects_non_objects_and_missing_ids() {
        let mut coll = MemoryCollection::new("team", DbConfig::none("id"));
        assert!(matches!(coll.add(json!([1, 2])), Err(StoreError::NotAnObject { .. })));
        assert!(matches!(coll.add(json!({ "name": "teamA" })), Err(StoreError::MissingId { .. })));
        assert!(coll.add(json!({ "id": "a", "name": "teamA" })).is_ok());
    }
}
