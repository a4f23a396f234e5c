use serde::{Deserialize, Serialize};

use crate::database::IdType;

/// Store configuration, applied to every collection it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    pub id_type: IdType,
    /// Document attribute holding the id.
    pub id_key: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { id_type: Default::default(), id_key: "id".to_string() }
    }
}

impl DbConfig {
    pub fn new(id_type: IdType, id_key: &str) -> Self {
        Self {
            id_type,
            id_key: id_key.to_string(),
        }
    }

    /// Sequential integer ids under `id_key`.
    pub fn int(id_key: &str) -> Self {
        Self::new(IdType::Int, id_key)
    }

    pub fn uuid(id_key: &str) -> Self {
        Self::new(IdType::Uuid, id_key)
    }

    /// Ids must be supplied by the caller.
    pub fn none(id_key: &str) -> Self {
        Self::new(IdType::None, id_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_config_helpers() {
        assert_eq!(DbConfig::default(), DbConfig::uuid("id"));
        assert_eq!(DbConfig::int("id").id_type, IdType::Int);

        let config: DbConfig = serde_json::from_str(r#"{ "id_type": "None", "id_key": "key" }"#).unwrap();
        assert_eq!(config, DbConfig::none("key"));
    }
}
