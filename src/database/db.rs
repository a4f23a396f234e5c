use std::{
    fs,
    future::Future,
    path::Path,
    sync::{Arc, RwLock},
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::{
    database::{DbConfig, MemoryCollection, StoreError},
    entity::Entity,
    executor::{AsyncExecutor, ExecutionError, Executor, PlanExecutor, Row},
    translator::Statement,
};

/// Shared handle to an in-memory store. One lock guards every collection,
/// so a single query always sees one consistent state.
pub type Db = Arc<RwLock<InternalDb>>;

#[derive(Debug, Default)]
pub struct InternalDb {
    config: DbConfig,
    collections: IndexMap<String, MemoryCollection>,
}

impl InternalDb {
    pub fn new(config: DbConfig) -> Self {
        Self { config, collections: IndexMap::new() }
    }

    pub fn into_protected(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    /// The collection named `name`, created on first use.
    pub fn create(&mut self, name: &str) -> &mut MemoryCollection {
        let config = self.config.clone();
        self.collections
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| MemoryCollection::new(name, config))
    }

    pub fn get(&self, name: &str) -> Option<&MemoryCollection> {
        self.collections.get(&name.to_ascii_lowercase())
    }

    pub fn list_collections(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}

pub trait DbCommon {
    fn new_db() -> Self;
    fn new_db_with_config(config: DbConfig) -> Self;
    fn create(&self, name: &str) -> Result<(), StoreError>;
    fn get_all(&self, name: &str) -> Result<Vec<Value>, StoreError>;
    fn list_collections(&self) -> Result<Vec<String>, StoreError>;
    /// Stores `entity` in its table and returns it as stored, id included.
    fn persist<E: Entity>(&self, entity: &E) -> Result<E, StoreError>;
    /// Adds every document of a JSON array. Returns how many were added.
    fn load_from_json(&self, name: &str, documents: Value) -> Result<usize, StoreError>;
    fn load_from_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<usize, StoreError>;
}

impl DbCommon for Db {
    fn new_db() -> Self {
        InternalDb::default().into_protected()
    }

    fn new_db_with_config(config: DbConfig) -> Self {
        InternalDb::new(config).into_protected()
    }

    fn create(&self, name: &str) -> Result<(), StoreError> {
        self.write().map_err(|_| StoreError::LockPoisoned)?.create(name);
        Ok(())
    }

    fn get_all(&self, name: &str) -> Result<Vec<Value>, StoreError> {
        let guard = self.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(name).map(MemoryCollection::get_all).unwrap_or_default())
    }

    fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read().map_err(|_| StoreError::LockPoisoned)?.list_collections())
    }

    fn persist<E: Entity>(&self, entity: &E) -> Result<E, StoreError> {
        let document = serde_json::to_value(entity)?;
        let stored = {
            let mut guard = self.write().map_err(|_| StoreError::LockPoisoned)?;
            guard.create(E::schema().table.as_str()).add(document)?
        };
        Ok(serde_json::from_value(stored)?)
    }

    fn load_from_json(&self, name: &str, documents: Value) -> Result<usize, StoreError> {
        let Value::Array(documents) = documents else {
            return Err(StoreError::NotAnArray);
        };
        let mut guard = self.write().map_err(|_| StoreError::LockPoisoned)?;
        let added = guard.create(name).add_batch(documents)?.len();
        debug!(collection = name, added, "documents loaded");
        Ok(added)
    }

    fn load_from_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<usize, StoreError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        let documents: Value = serde_json::from_str(&content)?;
        self.load_from_json(name, documents)
    }
}

impl Executor for Db {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, ExecutionError> {
        let guard = self.read().map_err(|_| ExecutionError::new("in-memory store lock poisoned"))?;
        PlanExecutor::run_query(statement.query(), &guard)
    }
}

impl AsyncExecutor for Db {
    fn execute_async(&self, statement: Statement) -> impl Future<Output = Result<Vec<Row>, ExecutionError>> + Send {
        let db = Arc::clone(self);
        async move {
            tokio::task::spawn_blocking(move || db.execute(&statement))
                .await
                .map_err(|e| ExecutionError::with_source("in-memory execution task failed", e))?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Member, Team};
    use serde_json::json;

    #[test]
    pub fn test_persist_assigns_ids_and_round_trips() {
        let db = Db::new_db_with_config(DbConfig::int("id"));
        let team = db.persist(&Team::new("teamA")).unwrap();
        assert_eq!(team.id, Some(1));

        let member = db.persist(&Member::new("member1", 10, Some(&team))).unwrap();
        assert_eq!(member.id, Some(1));
        assert_eq!(member.team_id, Some(1));

        assert_eq!(db.list_collections().unwrap(), vec!["team", "member"]);
        assert_eq!(db.get_all("member").unwrap()[0]["username"], json!("member1"));
    }

    #[test]
    pub fn test_load_from_json_requires_an_array() {
        let db = Db::new_db_with_config(DbConfig::int("id"));
        assert!(matches!(db.load_from_json("team", json!({ "name": "teamA" })), Err(StoreError::NotAnArray)));
        assert_eq!(db.load_from_json("team", json!([{ "name": "teamA" }, { "name": "teamB" }])).unwrap(), 2);
        assert!(db.get_all("unknown").unwrap().is_empty());
    }

    #[test]
    pub fn test_load_from_missing_file_is_an_io_error() {
        let db = Db::new_db();
        let err = db.load_from_file("team", "/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
