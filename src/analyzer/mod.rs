use tracing::trace;

use crate::{
    error::{QueryError, Result},
    expr::ValueType,
    query::{JoinCondition, Projection, Query},
};

pub mod analysis_context;
pub use analysis_context::*;

pub mod type_inference;
pub use type_inference::*;

pub mod grouping_rules;
pub use grouping_rules::*;

/// Structural validation of query descriptors. Nothing is translated or
/// executed for a descriptor that fails here.
pub struct Analyzer;

impl Analyzer {
    pub fn validate(query: &Query) -> Result<()> {
        Self::validate_in(query, None)?;
        trace!(query = %query, "query validated");
        Ok(())
    }

    /// Validates a subquery used as a value and returns its column type.
    pub fn validate_scalar_subquery(query: &Query, outer: &AnalysisContext) -> Result<(ValueType, bool)> {
        if !matches!(query.projection, Projection::Scalar(_)) {
            return QueryError::invalid("a subquery used as a value must select exactly one column").err();
        }
        let types = Self::validate_in(query, Some(outer))?;
        types
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::invalid("subquery selects nothing"))
    }

    /// Returns the type of every projected column.
    fn validate_in(query: &Query, outer: Option<&AnalysisContext>) -> Result<Vec<(ValueType, bool)>> {
        if let Some(message) = query.build_errors.first() {
            return QueryError::invalid(message.clone()).err();
        }
        if query.sources.is_empty() {
            return QueryError::invalid("query has no source entity; call from()").err();
        }
        if query.projection.is_empty() {
            return QueryError::invalid("query selects nothing").err();
        }

        let mut ctx = AnalysisContext::new(outer);
        for source in &query.sources {
            ctx.bind(source)?;
        }
        for join in &query.joins {
            if let JoinCondition::Association { source_alias, name, .. } = &join.condition {
                let source = ctx.resolve_entity(source_alias)?;
                let info = source.schema().association_info(name).ok_or_else(|| {
                    QueryError::unresolved(format!("{} has no association '{}'", source.entity_name(), name))
                })?;
                if info.target != join.target.entity_name() {
                    return QueryError::invalid(format!(
                        "association {}.{} leads to {}, not {}",
                        source_alias,
                        name,
                        info.target,
                        join.target.entity_name()
                    ))
                    .err();
                }
            }
            ctx.bind(&join.target)?;
        }

        for join in &query.joins {
            match &join.condition {
                JoinCondition::Association { filter: Some(filter), .. } | JoinCondition::Theta(filter) => {
                    TypeInference::check_predicate(filter, &ctx)?
                }
                JoinCondition::Association { filter: None, .. } => {}
            }
        }

        let mut types = Vec::with_capacity(query.projection.len());
        for identifier in query.projection.identifiers() {
            types.push(TypeInference::infer(&identifier.expression, &ctx)?);
        }

        if let Some(criteria) = &query.criteria {
            TypeInference::check_predicate(criteria, &ctx)?;
        }
        for key in &query.group_by {
            TypeInference::infer(key, &ctx)?;
        }
        if let Some(having) = &query.having {
            TypeInference::check_predicate(having, &ctx)?;
        }
        for order in &query.order_by {
            TypeInference::infer(&order.expr, &ctx)?;
        }

        GroupingRules::check(query)?;

        if let Some(offset) = query.offset {
            if offset < 0 {
                return QueryError::invalid(format!("offset must not be negative, got {}", offset)).err();
            }
        }
        if let Some(limit) = query.limit {
            if limit <= 0 {
                return QueryError::invalid(format!("limit must be positive, got {}", limit)).err();
            }
        }

        Ok(types)
    }
}
