use crate::{
    aggregates::is_aggregate_call,
    error::{QueryError, Result},
    expr::{Column, Predicate, ScalarExpr},
    query::{JoinCondition, Query},
};

/// Checks that a grouped query only uses grouped values outside of
/// aggregates.
pub struct GroupingRules;

impl GroupingRules {
    pub fn check(query: &Query) -> Result<()> {
        if let Some(criteria) = &query.criteria {
            if let Some(aggregate) = Self::first_aggregate(criteria) {
                return QueryError::invalid(format!("aggregate {} is not allowed in where; use having", aggregate)).err();
            }
        }
        for join in &query.joins {
            let condition = match &join.condition {
                JoinCondition::Association { filter: Some(filter), .. } | JoinCondition::Theta(filter) => filter,
                JoinCondition::Association { filter: None, .. } => continue,
            };
            if let Some(aggregate) = Self::first_aggregate(condition) {
                return QueryError::invalid(format!(
                    "aggregate {} is not allowed in the join condition of {}",
                    aggregate,
                    join.target.alias()
                ))
                .err();
            }
        }

        if query.having.is_some() && query.group_by.is_empty() {
            return QueryError::invalid("having requires group by").err();
        }

        if !query.is_grouped() {
            return Ok(());
        }

        let keys = &query.group_by;
        for identifier in query.projection.identifiers() {
            if !Self::is_grouped(&identifier.expression, keys) {
                return QueryError::invalid(format!(
                    "{} is selected but neither grouped nor aggregated",
                    identifier.expression
                ))
                .err();
            }
        }
        if let Some(having) = &query.having {
            if !Self::is_grouped_predicate(having, keys) {
                return QueryError::invalid(format!("having {:?} uses ungrouped values", having)).err();
            }
        }
        for order in &query.order_by {
            if !Self::is_grouped(&order.expr, keys) {
                return QueryError::invalid(format!("cannot order grouped rows by {}", order.expr)).err();
            }
        }
        Ok(())
    }

    fn first_aggregate(predicate: &Predicate) -> Option<String> {
        let mut aggregate = None;
        predicate.walk_scalars(&mut |e| {
            if aggregate.is_none() && is_aggregate_call(e) {
                aggregate = Some(e.to_string());
            }
        });
        aggregate
    }

    /// True when `expr` has one value per group.
    pub fn is_grouped(expr: &ScalarExpr, keys: &[ScalarExpr]) -> bool {
        if keys.contains(expr) {
            return true;
        }
        match expr {
            ScalarExpr::Literal(_) | ScalarExpr::Subquery(_) | ScalarExpr::WildCard => true,
            ScalarExpr::Function(_) if is_aggregate_call(expr) => true,
            // attributes of a grouped entity
            ScalarExpr::Column(Column::Attribute { alias, .. }) => keys.contains(&ScalarExpr::Entity(alias.clone())),
            ScalarExpr::Column(Column::Derived { .. }) | ScalarExpr::Entity(_) => false,
            ScalarExpr::Function(fun) => fun.args.iter().all(|a| Self::is_grouped(a, keys)),
            ScalarExpr::Arithmetic { left, right, .. } => Self::is_grouped(left, keys) && Self::is_grouped(right, keys),
            ScalarExpr::Case(case) => {
                case.branches
                    .iter()
                    .all(|(when, then)| Self::is_grouped_predicate(when, keys) && Self::is_grouped(then, keys))
                    && Self::is_grouped(&case.otherwise, keys)
            }
        }
    }

    pub fn is_grouped_predicate(predicate: &Predicate, keys: &[ScalarExpr]) -> bool {
        let g = |e: &ScalarExpr| Self::is_grouped(e, keys);
        match predicate {
            Predicate::And(items) | Predicate::Or(items) => items.iter().all(|p| Self::is_grouped_predicate(p, keys)),
            Predicate::Not(inner) => Self::is_grouped_predicate(inner, keys),
            Predicate::Compare { left, right, .. } => g(left) && g(right),
            Predicate::Between { expr, low, high, .. } => g(expr) && g(low) && g(high),
            Predicate::IsNull { expr, .. } | Predicate::InSubquery { expr, .. } => g(expr),
            Predicate::InList { expr, list, .. } => g(expr) && list.iter().all(g),
            Predicate::Like { expr, pattern, .. } => g(expr) && g(pattern),
            Predicate::Const3(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::{QMember, QTeam}, entity::EntityPath};

    #[test]
    pub fn test_attributes_of_grouped_entities_are_grouped() {
        let member = QMember::default();
        let team = QTeam::default();
        let keys = vec![ScalarExpr::Entity(team.alias().to_string())];

        assert!(GroupingRules::is_grouped(team.name.scalar(), &keys));
        assert!(GroupingRules::is_grouped(member.age.avg().scalar(), &keys));
        assert!(!GroupingRules::is_grouped(member.age.scalar(), &keys));
        assert!(GroupingRules::is_grouped_predicate(&member.age.avg().gt(10.0), &keys));
    }
}
