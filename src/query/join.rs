use crate::{
    entity::EntityRef,
    expr::{Predicate, Truth},
};

/// Only inner and left outer joins are expressible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    /// Through a declared association of the entity bound to
    /// `source_alias`, with an optional extra `on` filter.
    Association { source_alias: String, name: String, filter: Option<Predicate> },
    /// An arbitrary condition, used for joins on unrelated entities.
    Theta(Predicate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub target: EntityRef,
    pub condition: JoinCondition,
    /// Fetch joins load the target into the owning entity's association.
    pub fetch: bool,
}

impl Join {
    pub fn association(join_type: JoinType, source_alias: &str, name: &str, target: EntityRef) -> Self {
        Self {
            join_type,
            target,
            condition: JoinCondition::Association {
                source_alias: source_alias.to_string(),
                name: name.to_string(),
                filter: None,
            },
            fetch: false,
        }
    }

    /// A join on an unrelated entity. Until `on` is applied every pair of
    /// rows matches.
    pub fn theta(join_type: JoinType, target: EntityRef) -> Self {
        Self { join_type, target, condition: JoinCondition::Theta(Predicate::Const3(Truth::True)), fetch: false }
    }

    pub fn add_condition(&mut self, condition: Predicate) {
        match &mut self.condition {
            JoinCondition::Association { filter, .. } => {
                *filter = Some(match filter.take() {
                    Some(existing) => existing.and(condition),
                    None => condition,
                });
            }
            JoinCondition::Theta(existing) => {
                *existing = match std::mem::replace(existing, Predicate::Const3(Truth::True)) {
                    Predicate::Const3(Truth::True) => condition,
                    previous => previous.and(condition),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::Team, expr::Expr};

    #[test]
    pub fn test_on_replaces_the_open_theta_condition() {
        let name: Expr<String> = Expr::attribute("team", "name");
        let mut join = Join::theta(JoinType::Left, EntityRef::of::<Team>("team"));
        join.add_condition(name.eq("teamA"));

        match join.condition {
            JoinCondition::Theta(p) => assert_eq!(p, name.eq("teamA")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    pub fn test_on_accumulates_association_filters() {
        let name: Expr<String> = Expr::attribute("team", "name");
        let mut join = Join::association(JoinType::Inner, "member1", "team", EntityRef::of::<Team>("team"));
        join.add_condition(name.eq("teamA"));
        join.add_condition(name.ne("teamB"));

        match join.condition {
            JoinCondition::Association { filter: Some(Predicate::And(items)), .. } => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
