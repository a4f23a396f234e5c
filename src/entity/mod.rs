use std::{fmt, marker::PhantomData};

use serde::{Serialize, de::DeserializeOwned};

use crate::expr::{Expr, Function, ScalarExpr};

pub mod schema;
pub use schema::*;

/// A persistent type that can be queried. Implementations expose a static
/// schema; instances travel through serde when materialized.
pub trait Entity: Serialize + DeserializeOwned + Send + 'static {
    fn schema() -> &'static EntitySchema;
}

/// An entity bound to an alias inside a query.
#[derive(Clone)]
pub struct EntityRef {
    schema: &'static EntitySchema,
    alias: String,
}

impl EntityRef {
    pub fn new(schema: &'static EntitySchema, alias: &str) -> Self {
        Self { schema, alias: alias.to_string() }
    }

    pub fn of<E: Entity>(alias: &str) -> Self {
        Self::new(E::schema(), alias)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn entity_name(&self) -> &str {
        &self.schema.name
    }

    pub fn table(&self) -> &str {
        &self.schema.table
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.schema.name == other.schema.name
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.schema.name, self.alias)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self)
    }
}

/// Generated-style query path for an entity (`QMember`, `QTeam`).
pub trait EntityPath {
    type Entity: Entity;

    fn entity_ref(&self) -> &EntityRef;

    fn alias(&self) -> &str {
        self.entity_ref().alias()
    }

    /// `count(alias)`: number of rows in which this entity is present.
    fn count(&self) -> Expr<i64> {
        Expr::from_scalar(ScalarExpr::Function(Function::new(
            "count",
            vec![ScalarExpr::Entity(self.alias().to_string())],
        )))
    }

    fn association<E: Entity>(&self, name: &str) -> Association<E> {
        Association::new(self.alias(), name)
    }
}

/// A named to-one association from the entity bound to `source_alias`,
/// typed by its target entity.
pub struct Association<E> {
    source_alias: String,
    name: String,
    _target: PhantomData<fn() -> E>,
}

impl<E> Association<E> {
    pub fn new(source_alias: &str, name: &str) -> Self {
        Self { source_alias: source_alias.to_string(), name: name.to_string(), _target: PhantomData }
    }

    pub fn source_alias(&self) -> &str {
        &self.source_alias
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<E> Clone for Association<E> {
    fn clone(&self) -> Self {
        Self::new(&self.source_alias, &self.name)
    }
}

impl<E> fmt::Debug for Association<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Association({}.{})", self.source_alias, self.name)
    }
}
