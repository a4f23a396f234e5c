use serde::{Deserialize, Serialize};

use crate::translator::Dialect;

/// Settings shared by every query created from one `QueryFactory`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Target language the translator emits.
    #[serde(default)]
    pub dialect: Dialect,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jpql() -> Self {
        Self { dialect: Dialect::Jpql }
    }

    pub fn sql() -> Self {
        Self { dialect: Dialect::Sql }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_jpql() {
        assert_eq!(Config::default().dialect, Dialect::Jpql);
        assert_eq!(Config::sql().dialect, Dialect::Sql);
    }

    #[test]
    fn deserializes_from_json() {
        let config: Config = serde_json::from_str(r#"{ "dialect": "Sql" }"#).unwrap();
        assert_eq!(config, Config::sql());

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::jpql());
    }
}
