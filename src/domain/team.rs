use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    domain::Member,
    entity::{Association, Entity, EntityPath, EntityRef, EntitySchema},
    expr::{Expr, ValueType},
};

static TEAM_SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::new("Team", "team", "id")
        .field("id", ValueType::Int, true)
        .field("name", ValueType::String, false)
        .association("members", "Member", "id", "team_id")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Team {
    pub fn new(name: &str) -> Self {
        Self { id: None, name: name.to_string() }
    }
}

impl Entity for Team {
    fn schema() -> &'static EntitySchema {
        &TEAM_SCHEMA
    }
}

#[derive(Debug, Clone)]
pub struct QTeam {
    entity: EntityRef,
    pub id: Expr<i64>,
    pub name: Expr<String>,
}

impl QTeam {
    pub fn new(alias: &str) -> Self {
        Self {
            entity: EntityRef::of::<Team>(alias),
            id: Expr::attribute(alias, "id"),
            name: Expr::attribute(alias, "name"),
        }
    }

    /// One-to-many: joining it yields one row per member of the team.
    pub fn members(&self) -> Association<Member> {
        self.association("members")
    }
}

impl Default for QTeam {
    fn default() -> Self {
        Self::new("team")
    }
}

impl EntityPath for QTeam {
    type Entity = Team;

    fn entity_ref(&self) -> &EntityRef {
        &self.entity
    }
}
