use std::fmt;

use crate::{
    aggregates::is_aggregate_call,
    entity::EntityRef,
    expr::{Predicate, ScalarExpr},
    query::{Join, OrderBy, Projection},
};

/// Immutable description of a query. The builder produces it; everything
/// downstream only reads it.
#[derive(Clone, PartialEq)]
pub struct Query {
    pub projection: Projection,
    pub sources: Vec<EntityRef>,
    pub joins: Vec<Join>,
    pub criteria: Option<Predicate>,
    pub group_by: Vec<ScalarExpr>,
    pub having: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// Builder misuse that could not be rejected at the call site. Reported
    /// by validation.
    pub(crate) build_errors: Vec<String>,
}

impl Query {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            sources: vec![],
            joins: vec![],
            criteria: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            offset: None,
            limit: None,
            build_errors: vec![],
        }
    }

    /// Every entity bound by this query, sources first, then join targets.
    pub fn bindings(&self) -> impl Iterator<Item = &EntityRef> {
        self.sources.iter().chain(self.joins.iter().map(|j| &j.target))
    }

    pub fn binding(&self, alias: &str) -> Option<&EntityRef> {
        self.bindings().find(|e| e.alias() == alias)
    }

    /// True when rows collapse into groups: explicit grouping, or an
    /// aggregate anywhere in the select list, having or order by.
    pub fn is_grouped(&self) -> bool {
        if !self.group_by.is_empty() {
            return true;
        }
        let mut found = false;
        for identifier in self.projection.identifiers() {
            identifier.expression.walk(&mut |e| found |= is_aggregate_call(e));
        }
        if let Some(having) = &self.having {
            having.walk_scalars(&mut |e| found |= is_aggregate_call(e));
        }
        for order in &self.order_by {
            order.expr.walk(&mut |e| found |= is_aggregate_call(e));
        }
        found
    }

    /// Visits every scalar expression owned directly by this query.
    pub fn walk_scalars<'a>(&'a self, visit: &mut dyn FnMut(&'a ScalarExpr)) {
        for identifier in self.projection.identifiers() {
            identifier.expression.walk(visit);
        }
        for join in &self.joins {
            match &join.condition {
                crate::query::JoinCondition::Association { filter: Some(p), .. }
                | crate::query::JoinCondition::Theta(p) => p.walk_scalars(visit),
                crate::query::JoinCondition::Association { filter: None, .. } => {}
            }
        }
        if let Some(criteria) = &self.criteria {
            criteria.walk_scalars(visit);
        }
        self.group_by.iter().for_each(|g| g.walk(visit));
        if let Some(having) = &self.having {
            having.walk_scalars(visit);
        }
        self.order_by.iter().for_each(|o| o.expr.walk(visit));
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proj = self.projection.identifiers().iter().map(|p| format!("{:?}", p)).collect::<Vec<_>>().join(", ");
        let sources = self.sources.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
        let joins = self.joins.iter().map(|j| format!("{:?}", j)).collect::<Vec<_>>().join(", ");
        let crit = match &self.criteria {
            Some(c) => format!("{:?}", c),
            None => "None".to_string(),
        };
        let group = self.group_by.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(", ");
        let having = match &self.having {
            Some(h) => format!("{:?}", h),
            None => "None".to_string(),
        };
        let order = self.order_by.iter().map(|o| format!("{:?}", o)).collect::<Vec<_>>().join(", ");

        write!(
            f,
            "Query(projection=[{}], sources=[{}], joins=[{}], criteria={}, group_by=[{}], having={}, order_by=[{}], offset={:?}, limit={:?})",
            proj, sources, joins, crit, group, having, order, self.offset, self.limit
        )
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
