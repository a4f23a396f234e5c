use serde_json::Value;
use uuid::Uuid;

use crate::database::IdType;

/// Generates ids for one collection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdManager {
    pub id_type: IdType,
    current: u64,
}

impl IdManager {
    pub fn new(id_type: IdType) -> Self {
        Self { id_type, current: 0 }
    }

    /// Records an id supplied by the caller so generated integers never
    /// collide with it.
    pub fn observe(&mut self, id: &Value) {
        if let (IdType::Int, Some(id)) = (self.id_type, id.as_u64()) {
            self.current = self.current.max(id);
        }
    }
}

impl Iterator for IdManager {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.id_type {
            IdType::Int => {
                self.current = self.current.checked_add(1)?;
                Some(Value::Number(self.current.into()))
            }
            IdType::Uuid => Some(Value::String(Uuid::new_v4().to_string())),
            IdType::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    pub fn test_int_ids_continue_after_observed_ones() {
        let mut ids = IdManager::new(IdType::Int);
        assert_eq!(ids.next(), Some(json!(1)));
        ids.observe(&json!(10));
        ids.observe(&json!(3));
        assert_eq!(ids.next(), Some(json!(11)));
    }

    #[test]
    pub fn test_uuid_and_none() {
        let mut ids = IdManager::new(IdType::Uuid);
        let id = ids.next().unwrap();
        assert!(Uuid::parse_str(id.as_str().unwrap()).is_ok());
        assert_eq!(IdManager::new(IdType::None).next(), None);
    }
}
