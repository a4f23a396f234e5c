use crate::{
    entity::EntityRef,
    executor::ExecutionError,
    expr::{Column, Predicate, ScalarExpr, Truth},
    planner::{AggregateCall, Fetch, GroupKey, LogicalPlan},
    query::{JoinCondition, JoinType, OrderBy, Query},
};

/// Lowers a validated query into the operator tree the in-memory executor
/// runs. Subqueries must already be replaced by their values.
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn from_query(query: &Query) -> Result<LogicalPlan, ExecutionError> {
        let mut sources = query.sources.iter();
        let first = sources.next().ok_or_else(|| ExecutionError::new("planner: no entity to scan"))?;
        let mut plan = Self::scan(first);

        // additional roots are cross joined
        for source in sources {
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(Self::scan(source)),
                join_type: JoinType::Inner,
                on: Predicate::Const3(Truth::True),
                null_keys: vec![],
            };
        }

        for join in &query.joins {
            let on = match &join.condition {
                JoinCondition::Association { source_alias, name, filter } => {
                    let source = query
                        .binding(source_alias)
                        .ok_or_else(|| ExecutionError::new(format!("planner: alias {} is not bound", source_alias)))?;
                    let info = source.schema().association_info(name).ok_or_else(|| {
                        ExecutionError::new(format!("planner: {} has no association {}", source.entity_name(), name))
                    })?;
                    let keys = Predicate::eq(
                        ScalarExpr::column(source_alias, &info.local_key),
                        ScalarExpr::column(join.target.alias(), &info.target_key),
                    );
                    match filter {
                        Some(filter) => keys.and(filter.clone()),
                        None => keys,
                    }
                }
                JoinCondition::Theta(condition) => condition.clone(),
            };
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(Self::scan(&join.target)),
                join_type: join.join_type,
                on,
                null_keys: Self::keys_of(&join.target),
            };
        }

        if let Some(criteria) = &query.criteria {
            plan = LogicalPlan::Filter { input: Box::new(plan), predicate: criteria.clone() };
        }

        let mut exprs: Vec<ScalarExpr> = query.projection.identifiers().iter().map(|i| i.expression.clone()).collect();
        let mut order_by = query.order_by.clone();

        if query.is_grouped() {
            let group_keys = query
                .group_by
                .iter()
                .enumerate()
                .map(|(i, key)| Self::group_key(query, i, key))
                .collect::<Result<Vec<_>, _>>()?;

            let mut aggs = vec![];
            exprs.iter().for_each(|e| AggregateCall::collect(e, &mut aggs));
            if let Some(having) = &query.having {
                AggregateCall::collect_in_predicate(having, &mut aggs);
            }
            order_by.iter().for_each(|o| AggregateCall::collect(&o.expr, &mut aggs));

            let mut rewrite = |e: &ScalarExpr| Self::grouped_replacement(e, &group_keys, &aggs);
            let having = query.having.as_ref().map(|h| h.transform(&mut rewrite));
            exprs = exprs.iter().map(|e| e.transform(&mut rewrite)).collect();
            order_by = order_by
                .into_iter()
                .map(|o| OrderBy { expr: o.expr.transform(&mut rewrite), ..o })
                .collect();

            plan = LogicalPlan::Aggregate { input: Box::new(plan), group_keys, aggs };
            if let Some(having) = having {
                plan = LogicalPlan::Filter { input: Box::new(plan), predicate: having };
            }
        }

        if !order_by.is_empty() {
            plan = LogicalPlan::Sort { input: Box::new(plan), keys: order_by };
        }

        if query.limit.is_some() || query.offset.is_some() {
            plan = LogicalPlan::Limit { input: Box::new(plan), limit: query.limit, offset: query.offset };
        }

        let fetches = query
            .joins
            .iter()
            .filter(|j| j.fetch)
            .filter_map(|j| match &j.condition {
                JoinCondition::Association { source_alias, name, .. } => Some(Fetch {
                    source_alias: source_alias.clone(),
                    association: name.clone(),
                    target_alias: j.target.alias().to_string(),
                }),
                JoinCondition::Theta(_) => None,
            })
            .collect();

        Ok(LogicalPlan::Project { input: Box::new(plan), exprs, fetches })
    }

    fn scan(entity: &EntityRef) -> LogicalPlan {
        LogicalPlan::Scan {
            collection: entity.table().to_string(),
            alias: entity.alias().to_string(),
            fields: entity.schema().fields.keys().cloned().collect(),
        }
    }

    fn keys_of(entity: &EntityRef) -> Vec<String> {
        entity.schema().fields.keys().map(|f| format!("{}.{}", entity.alias(), f)).collect()
    }

    fn group_key(query: &Query, index: usize, key: &ScalarExpr) -> Result<GroupKey, ExecutionError> {
        Ok(match key {
            ScalarExpr::Column(column) => GroupKey::Column(column.clone()),
            ScalarExpr::Entity(alias) => {
                let entity = query
                    .binding(alias)
                    .ok_or_else(|| ExecutionError::new(format!("planner: alias {} is not bound", alias)))?;
                GroupKey::Entity { alias: alias.clone(), fields: entity.schema().fields.keys().cloned().collect() }
            }
            other => GroupKey::Computed { expr: other.clone(), name: format!("__key{}", index) },
        })
    }

    /// Group outputs replace the expressions they were computed from.
    fn grouped_replacement(expr: &ScalarExpr, keys: &[GroupKey], aggs: &[AggregateCall]) -> Option<ScalarExpr> {
        let computed = keys.iter().find_map(|k| match k {
            GroupKey::Computed { expr: key, name } if key == expr => Some(ScalarExpr::Column(Column::derived(name.clone()))),
            _ => None,
        });
        computed.or_else(|| AggregateCall::replacement(expr, aggs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{QMember, QTeam},
        query::QueryFactory,
    };

    #[test]
    pub fn test_plain_query_plan_shape() {
        let member = QMember::default();
        let query = QueryFactory::default()
            .select_from(&member)
            .r#where(member.age.gt(10))
            .order_by(member.age.desc())
            .limit(2)
            .into_query();

        let plan = PlanBuilder::from_query(&query).unwrap();
        let LogicalPlan::Project { input, exprs, fetches } = plan else { panic!("expected project") };
        assert_eq!(exprs, vec![ScalarExpr::Entity("member1".into())]);
        assert!(fetches.is_empty());
        let LogicalPlan::Limit { input, limit: Some(2), offset: None } = *input else { panic!("expected limit") };
        let LogicalPlan::Sort { input, .. } = *input else { panic!("expected sort") };
        let LogicalPlan::Filter { input, .. } = *input else { panic!("expected filter") };
        assert!(matches!(*input, LogicalPlan::Scan { ref collection, .. } if collection == "member"));
    }

    #[test]
    pub fn test_grouped_query_rewrites_aggregates() {
        let member = QMember::default();
        let team = QTeam::default();
        let query = QueryFactory::default()
            .select((&team.name, member.age.avg()))
            .from(&member)
            .join(member.team(), &team)
            .group_by(&team.name)
            .having(member.age.avg().gt(10.0))
            .into_query();

        let plan = PlanBuilder::from_query(&query).unwrap();
        let LogicalPlan::Project { input, exprs, .. } = plan else { panic!("expected project") };
        assert_eq!(exprs[0], ScalarExpr::column("team", "name"));
        assert_eq!(exprs[1], ScalarExpr::Column(Column::derived("__agg0")));

        let LogicalPlan::Filter { input, .. } = *input else { panic!("expected having") };
        let LogicalPlan::Aggregate { input, group_keys, aggs } = *input else { panic!("expected aggregate") };
        assert_eq!(group_keys, vec![GroupKey::Column(Column::attribute("team", "name"))]);
        assert_eq!(aggs.len(), 1);

        let LogicalPlan::Join { on, null_keys, .. } = *input else { panic!("expected join") };
        assert_eq!(null_keys, vec!["team.id", "team.name"]);
        assert_eq!(on, Predicate::eq(ScalarExpr::column("member1", "team_id"), ScalarExpr::column("team", "id")));
    }
}
