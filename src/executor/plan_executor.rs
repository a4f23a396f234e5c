use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    aggregates::{Accumulator, AggregateImpl, DEFAULT_AGGREGATES},
    database::InternalDb,
    executor::{ExecutionError, Row, eval::Eval, helpers::Helpers},
    expr::{CaseExpr, Column, Literal, Predicate, ScalarExpr},
    planner::{AggregateCall, Fetch, GroupKey, LogicalPlan, PlanBuilder},
    query::{JoinCondition, JoinType, Query},
};

type Record = Map<String, Value>;

struct Group {
    keys: Record,
    accs: Vec<Box<dyn Accumulator>>,
    seen: Vec<HashSet<String>>,
}

impl Group {
    fn new(keys: Record, impls: &[std::sync::Arc<dyn AggregateImpl>]) -> Self {
        Self {
            keys,
            accs: impls.iter().map(|i| i.create_accumulator()).collect(),
            seen: vec![HashSet::new(); impls.len()],
        }
    }
}

/// Runs query descriptors directly against an in-memory store.
pub struct PlanExecutor;

impl PlanExecutor {
    /// Evaluates `query` against one consistent view of `db`.
    pub fn run_query(query: &Query, db: &InternalDb) -> Result<Vec<Row>, ExecutionError> {
        let query = Self::inline_subqueries(query, db)?;
        let plan = PlanBuilder::from_query(&query)?;
        trace!(?plan, "plan built");

        let LogicalPlan::Project { input, exprs, fetches } = &plan else {
            return Err(ExecutionError::new("plan must end with a projection"));
        };
        let records = Self::run_plan(input, db)?;
        let rows: Vec<Row> = records
            .iter()
            .map(|record| Row(exprs.iter().map(|e| Self::project(e, record, fetches)).collect()))
            .collect();

        debug!(rows = rows.len(), "in-memory plan executed");
        Ok(rows)
    }

    pub fn run_plan(plan: &LogicalPlan, db: &InternalDb) -> Result<Vec<Record>, ExecutionError> {
        let out: Vec<Record> = match plan {
            LogicalPlan::Scan { collection, alias, fields } => {
                let Some(coll) = db.get(collection) else {
                    return Ok(vec![]);
                };
                coll.rows()
                    .filter_map(Value::as_object)
                    .map(|doc| {
                        fields
                            .iter()
                            .map(|f| (format!("{}.{}", alias, f), doc.get(f).cloned().unwrap_or(Value::Null)))
                            .collect::<Record>()
                    })
                    .collect()
            }
            LogicalPlan::Join { left, right, join_type, on, null_keys } => {
                let left_rows = Self::run_plan(left, db)?;
                let right_rows = Self::run_plan(right, db)?;

                let mut out = Vec::new();
                for l in &left_rows {
                    let mut matched = false;
                    for r in &right_rows {
                        let mut merged = l.clone();
                        merged.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
                        if Eval::eval_predicate3(on, &merged).is_true() {
                            out.push(merged);
                            matched = true;
                        }
                    }
                    if !matched && *join_type == JoinType::Left {
                        let mut extended = l.clone();
                        extended.extend(null_keys.iter().map(|k| (k.clone(), Value::Null)));
                        out.push(extended);
                    }
                }
                out
            }
            LogicalPlan::Filter { input, predicate } => Self::run_plan(input, db)?
                .into_iter()
                .filter(|row| Eval::eval_predicate3(predicate, row).is_true())
                .collect(),
            LogicalPlan::Aggregate { input, group_keys, aggs } => {
                let rows = Self::run_plan(input, db)?;
                Self::aggregate_rows(&rows, group_keys, aggs)?
            }
            LogicalPlan::Sort { input, keys } => {
                let rows = Self::run_plan(input, db)?;
                let mut decorated: Vec<(Vec<Value>, Record)> = rows
                    .into_iter()
                    .map(|row| (keys.iter().map(|k| Eval::eval_scalar(&k.expr, &row)).collect(), row))
                    .collect();
                // stable
                decorated.sort_by(|(a, _), (b, _)| {
                    keys.iter()
                        .zip(a.iter().zip(b.iter()))
                        .map(|(k, (av, bv))| Helpers::cmp_for_sort(av, bv, k.ascending(), k.nulls))
                        .find(|ord| !ord.is_eq())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                decorated.into_iter().map(|(_, row)| row).collect()
            }
            LogicalPlan::Limit { input, limit, offset } => {
                let rows = Self::run_plan(input, db)?;
                let start = offset.unwrap_or(0).max(0) as usize;
                let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
                rows.into_iter().skip(start).take(take).collect()
            }
            LogicalPlan::Project { .. } => {
                return Err(ExecutionError::new("projection must be the root of the plan"));
            }
        };
        trace!(rows = out.len(), "plan node evaluated");
        Ok(out)
    }

    fn project(expr: &ScalarExpr, record: &Record, fetches: &[Fetch]) -> Value {
        let ScalarExpr::Entity(alias) = expr else {
            return Eval::eval_scalar(expr, record);
        };
        let mut entity = Eval::eval_entity(alias, record);
        if let Value::Object(object) = &mut entity {
            for fetch in fetches.iter().filter(|f| &f.source_alias == alias) {
                object.insert(fetch.association.clone(), Eval::eval_entity(&fetch.target_alias, record));
            }
        }
        entity
    }

    fn aggregate_rows(rows: &[Record], group_keys: &[GroupKey], aggs: &[AggregateCall]) -> Result<Vec<Record>, ExecutionError> {
        let impls = aggs
            .iter()
            .map(|call| {
                DEFAULT_AGGREGATES
                    .get(&call.func)
                    .ok_or_else(|| ExecutionError::new(format!("unknown aggregate {}", call.func)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let key_exprs: Vec<(String, ScalarExpr)> =
            group_keys.iter().flat_map(|k| k.keys().into_iter().zip(k.exprs())).collect();

        let mut groups: IndexMap<String, Group> = IndexMap::new();
        if group_keys.is_empty() {
            // aggregates over no rows still yield one row
            groups.insert(Helpers::canonical_tuple(&[]), Group::new(Record::new(), &impls));
        }

        for row in rows {
            let values: Vec<Value> = key_exprs.iter().map(|(_, e)| Eval::eval_scalar(e, row)).collect();
            let gk = Helpers::canonical_tuple(&values);
            let group = groups.entry(gk).or_insert_with(|| {
                let keys = key_exprs.iter().map(|(name, _)| name.clone()).zip(values).collect();
                Group::new(keys, &impls)
            });

            for (i, call) in aggs.iter().enumerate() {
                let args: Vec<Value> = if call.is_count_star() {
                    vec![]
                } else {
                    call.args.iter().map(|a| Eval::eval_scalar(a, row)).collect()
                };
                if call.distinct && !group.seen[i].insert(Helpers::canonical_tuple(&args)) {
                    continue;
                }
                group.accs[i].update(&args)?;
            }
        }

        Ok(groups
            .into_values()
            .map(|group| {
                let mut out = group.keys;
                for (call, acc) in aggs.iter().zip(group.accs.iter()) {
                    out.insert(call.name.clone(), acc.finalize());
                }
                out
            })
            .collect())
    }

    /// Replaces every uncorrelated subquery by its result. Correlated
    /// subqueries are rejected.
    fn inline_subqueries(query: &Query, db: &InternalDb) -> Result<Query, ExecutionError> {
        let mut out = query.clone();
        for identifier in out.projection.identifiers_mut() {
            identifier.expression = Self::inline_scalar(&identifier.expression, db)?;
        }
        for join in &mut out.joins {
            match &mut join.condition {
                JoinCondition::Association { filter: Some(p), .. } | JoinCondition::Theta(p) => {
                    *p = Self::inline_predicate(p, db)?
                }
                JoinCondition::Association { filter: None, .. } => {}
            }
        }
        if let Some(criteria) = &out.criteria {
            out.criteria = Some(Self::inline_predicate(criteria, db)?);
        }
        for key in &mut out.group_by {
            *key = Self::inline_scalar(key, db)?;
        }
        if let Some(having) = &out.having {
            out.having = Some(Self::inline_predicate(having, db)?);
        }
        for order in &mut out.order_by {
            order.expr = Self::inline_scalar(&order.expr, db)?;
        }
        Ok(out)
    }

    fn inline_scalar(expr: &ScalarExpr, db: &InternalDb) -> Result<ScalarExpr, ExecutionError> {
        let mut failure = None;
        let out = expr.transform(&mut |e| Self::inline_replacement(e, db, &mut failure));
        match failure {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }

    fn inline_replacement(
        expr: &ScalarExpr,
        db: &InternalDb,
        failure: &mut Option<ExecutionError>,
    ) -> Option<ScalarExpr> {
        let replaced = match expr {
            ScalarExpr::Subquery(query) => Self::scalar_subquery(query, db).map(ScalarExpr::Literal),
            ScalarExpr::Case(case) => Self::inline_case(case, db),
            _ => return None,
        };
        match replaced {
            Ok(replaced) => Some(replaced),
            Err(err) => {
                failure.get_or_insert(err);
                Some(expr.clone())
            }
        }
    }

    fn inline_case(case: &CaseExpr, db: &InternalDb) -> Result<ScalarExpr, ExecutionError> {
        let branches = case
            .branches
            .iter()
            .map(|(when, then)| Ok((Self::inline_predicate(when, db)?, Self::inline_scalar(then, db)?)))
            .collect::<Result<Vec<_>, ExecutionError>>()?;
        Ok(ScalarExpr::Case(CaseExpr { branches, otherwise: Box::new(Self::inline_scalar(&case.otherwise, db)?) }))
    }

    fn inline_predicate(predicate: &Predicate, db: &InternalDb) -> Result<Predicate, ExecutionError> {
        let all = |items: &[Predicate]| items.iter().map(|p| Self::inline_predicate(p, db)).collect::<Result<Vec<_>, _>>();
        Ok(match predicate {
            Predicate::And(items) => Predicate::And(all(items)?),
            Predicate::Or(items) => Predicate::Or(all(items)?),
            Predicate::Not(inner) => Predicate::Not(Box::new(Self::inline_predicate(inner, db)?)),
            Predicate::InSubquery { expr, query, negated } => Predicate::InList {
                expr: Self::inline_scalar(expr, db)?,
                list: Self::subquery_values(query, db)?.into_iter().map(ScalarExpr::Literal).collect(),
                negated: *negated,
            },
            other => {
                let mut failure = None;
                let out = other.transform(&mut |e| Self::inline_replacement(e, db, &mut failure));
                if let Some(err) = failure {
                    return Err(err);
                }
                out
            }
        })
    }

    fn scalar_subquery(query: &Query, db: &InternalDb) -> Result<Literal, ExecutionError> {
        let mut values = Self::subquery_values(query, db)?;
        match values.len() {
            0 => Ok(Literal::Null),
            1 => Ok(values.remove(0)),
            n => Err(ExecutionError::new(format!("scalar subquery returned {} rows", n))),
        }
    }

    fn subquery_values(query: &Query, db: &InternalDb) -> Result<Vec<Literal>, ExecutionError> {
        if let Some(alias) = Self::free_alias(query) {
            return Err(ExecutionError::new(format!(
                "correlated subqueries are not supported in memory (outer alias {})",
                alias
            )));
        }
        Self::run_query(query, db)?
            .into_iter()
            .map(|row| {
                row.values()
                    .first()
                    .and_then(Literal::from_value)
                    .ok_or_else(|| ExecutionError::new("subquery must select a single scalar column"))
            })
            .collect()
    }

    /// An alias referenced by `query` but bound by an enclosing query.
    fn free_alias(query: &Query) -> Option<String> {
        let mut free = None;
        query.walk_scalars(&mut |e| {
            let alias = match e {
                ScalarExpr::Column(Column::Attribute { alias, .. }) | ScalarExpr::Entity(alias) => alias,
                _ => return,
            };
            if free.is_none() && query.binding(alias).is_none() {
                free = Some(alias.clone());
            }
        });
        free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QMember;
    use serde_json::json;

    fn record(age: i64) -> Record {
        let mut row = Record::new();
        row.insert("member1.age".to_string(), json!(age));
        row
    }

    #[test]
    pub fn test_keyless_aggregate_yields_exactly_one_row() {
        let member = QMember::default();
        let mut calls = vec![];
        AggregateCall::collect(member.age.max().scalar(), &mut calls);
        AggregateCall::collect(&ScalarExpr::function("count", vec![ScalarExpr::WildCard]), &mut calls);

        let rows = [record(10), record(40), record(20)];
        let out = PlanExecutor::aggregate_rows(&rows, &[], &calls).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["__agg0"], json!(40));
        assert_eq!(out[0]["__agg1"], json!(3));

        let empty = PlanExecutor::aggregate_rows(&[], &[], &calls).unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0]["__agg0"], Value::Null);
        assert_eq!(empty[0]["__agg1"], json!(0));
    }
}
