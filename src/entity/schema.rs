use indexmap::IndexMap;

use crate::expr::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: ValueType,
    pub nullable: bool,
}

/// A to-one relationship: `local_key` on the owning entity points at
/// `target_key` on `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationInfo {
    pub target: String,
    pub local_key: String,
    pub target_key: String,
}

/// Static description of an entity: its name in JPQL, its table in SQL,
/// its attributes and the associations it can be joined through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub id_field: String,
    pub fields: IndexMap<String, FieldInfo>,
    pub associations: IndexMap<String, AssociationInfo>,
}

impl EntitySchema {
    pub fn new(name: &str, table: &str, id_field: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            id_field: id_field.to_string(),
            fields: IndexMap::new(),
            associations: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: &str, ty: ValueType, nullable: bool) -> Self {
        self.fields.insert(name.to_string(), FieldInfo { ty, nullable });
        self
    }

    pub fn association(mut self, name: &str, target: &str, local_key: &str, target_key: &str) -> Self {
        self.associations.insert(
            name.to_string(),
            AssociationInfo {
                target: target.to_string(),
                local_key: local_key.to_string(),
                target_key: target_key.to_string(),
            },
        );
        self
    }

    pub fn field_info(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn association_info(&self, name: &str) -> Option<&AssociationInfo> {
        self.associations.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_builder_keeps_declaration_order() {
        let schema = EntitySchema::new("Member", "member", "id")
            .field("id", ValueType::Int, true)
            .field("username", ValueType::String, true)
            .field("age", ValueType::Int, false)
            .association("team", "Team", "team_id", "id");

        let names = schema.fields.keys().cloned().collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "username", "age"]);
        assert_eq!(schema.association_info("team").map(|a| a.local_key.as_str()), Some("team_id"));
        assert!(schema.field_info("team").is_none());
    }
}
