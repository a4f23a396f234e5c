use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    domain::Team,
    entity::{Association, Entity, EntityPath, EntityRef, EntitySchema},
    expr::{Expr, ValueType},
};

static MEMBER_SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::new("Member", "member", "id")
        .field("id", ValueType::Int, true)
        .field("username", ValueType::String, true)
        .field("age", ValueType::Int, false)
        .field("team_id", ValueType::Int, true)
        .association("team", "Team", "team_id", "id")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: Option<String>,
    pub age: i64,
    #[serde(default)]
    pub team_id: Option<i64>,
    /// Populated only when the team was fetch-joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl Member {
    pub fn new(username: &str, age: i64, team: Option<&Team>) -> Self {
        Self {
            id: None,
            username: Some(username.to_string()),
            age,
            team_id: team.and_then(|t| t.id),
            team: None,
        }
    }

    pub fn anonymous(age: i64) -> Self {
        Self { id: None, username: None, age, team_id: None, team: None }
    }

    /// Moves the member to `team`. Only the foreign key is persisted.
    pub fn change_team(&mut self, team: &Team) {
        self.team_id = team.id;
    }
}

impl Entity for Member {
    fn schema() -> &'static EntitySchema {
        &MEMBER_SCHEMA
    }
}

#[derive(Debug, Clone)]
pub struct QMember {
    entity: EntityRef,
    pub id: Expr<i64>,
    pub username: Expr<String>,
    pub age: Expr<i64>,
    pub team_id: Expr<i64>,
}

impl QMember {
    pub fn new(alias: &str) -> Self {
        Self {
            entity: EntityRef::of::<Member>(alias),
            id: Expr::attribute(alias, "id"),
            username: Expr::attribute(alias, "username"),
            age: Expr::attribute(alias, "age"),
            team_id: Expr::attribute(alias, "team_id"),
        }
    }

    pub fn team(&self) -> Association<Team> {
        self.association("team")
    }
}

impl Default for QMember {
    fn default() -> Self {
        Self::new("member1")
    }
}

impl EntityPath for QMember {
    type Entity = Member;

    fn entity_ref(&self) -> &EntityRef {
        &self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    pub fn test_member_round_trips_through_json() {
        let team = Team { id: Some(1), name: "teamA".to_string() };
        let member = Member::new("member1", 10, Some(&team));

        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value, json!({ "id": null, "username": "member1", "age": 10, "team_id": 1 }));

        let back: Member = serde_json::from_value(value).unwrap();
        assert_eq!(back, member);
    }

    #[test]
    pub fn test_default_paths_use_conventional_aliases() {
        let member = QMember::default();
        assert_eq!(member.alias(), "member1");
        assert_eq!(member.age.to_string(), "member1.age");
        assert_eq!(member.team().name(), "team");
        assert_eq!(member.team().source_alias(), "member1");
    }
}
