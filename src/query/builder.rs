use std::sync::Arc;

use crate::{
    analyzer::Analyzer,
    config::Config,
    entity::{Association, Entity, EntityPath},
    error::Result,
    executor::{AsyncExecutor, Executor},
    expr::{IntoScalar, Named, Predicate, ScalarExpr},
    materializer::{QueryResults, RowMapper, Selection},
    query::{Join, JoinType, OrderBy, Query, TypedQuery},
};

/// Fluent, typed query construction. `R` is the type every result row
/// materializes into; it is fixed by the selection.
///
/// Builder methods only record what they are given. All validation happens
/// in `build` (and therefore in every `fetch*` shortcut).
pub struct QueryBuilder<R> {
    query: Query,
    mapper: RowMapper<R>,
    config: Config,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        Self { query: self.query.clone(), mapper: Arc::clone(&self.mapper), config: self.config }
    }
}

impl<R> std::fmt::Debug for QueryBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueryBuilder({})", self.query)
    }
}

impl<R> QueryBuilder<R> {
    pub(crate) fn new<S: Selection<Output = R>>(config: Config, selection: S) -> Self {
        let (projection, mapper) = selection.into_selection();
        Self { query: Query::new(projection), mapper, config }
    }

    pub fn from<P: EntityPath>(mut self, path: &P) -> Self {
        self.query.sources.push(path.entity_ref().clone());
        self
    }

    /// Inner join through an association.
    pub fn join<E: Entity, P: EntityPath<Entity = E>>(self, association: Association<E>, target: &P) -> Self {
        self.push_association(JoinType::Inner, association, target)
    }

    pub fn inner_join<E: Entity, P: EntityPath<Entity = E>>(self, association: Association<E>, target: &P) -> Self {
        self.push_association(JoinType::Inner, association, target)
    }

    pub fn left_join<E: Entity, P: EntityPath<Entity = E>>(self, association: Association<E>, target: &P) -> Self {
        self.push_association(JoinType::Left, association, target)
    }

    /// Inner join on an unrelated entity; the condition comes from `on`.
    pub fn join_entity<P: EntityPath>(mut self, target: &P) -> Self {
        self.query.joins.push(Join::theta(JoinType::Inner, target.entity_ref().clone()));
        self
    }

    /// Left join on an unrelated entity; the condition comes from `on`.
    pub fn left_join_entity<P: EntityPath>(mut self, target: &P) -> Self {
        self.query.joins.push(Join::theta(JoinType::Left, target.entity_ref().clone()));
        self
    }

    /// `join_entity(target).on(condition)` in one call.
    pub fn join_on<P: EntityPath>(self, target: &P, condition: Predicate) -> Self {
        self.join_entity(target).on(condition)
    }

    pub fn left_join_on<P: EntityPath>(self, target: &P, condition: Predicate) -> Self {
        self.left_join_entity(target).on(condition)
    }

    fn push_association<E: Entity, P: EntityPath<Entity = E>>(
        mut self,
        join_type: JoinType,
        association: Association<E>,
        target: &P,
    ) -> Self {
        self.query.joins.push(Join::association(
            join_type,
            association.source_alias(),
            association.name(),
            target.entity_ref().clone(),
        ));
        self
    }

    /// Adds a condition to the most recent join.
    pub fn on(mut self, condition: Predicate) -> Self {
        match self.query.joins.last_mut() {
            Some(join) => join.add_condition(condition),
            None => self.query.build_errors.push("on() must follow a join".to_string()),
        }
        self
    }

    /// Marks the most recent join as a fetch join.
    pub fn fetch_join(mut self) -> Self {
        match self.query.joins.last_mut() {
            Some(join) if matches!(join.condition, crate::query::JoinCondition::Association { .. }) => join.fetch = true,
            Some(_) => self.query.build_errors.push("fetch join requires an association join".to_string()),
            None => self.query.build_errors.push("fetch_join() must follow a join".to_string()),
        }
        self
    }

    /// Adds a filter. Repeated calls are combined with `and`.
    pub fn r#where(mut self, condition: Predicate) -> Self {
        self.query.criteria = Some(match self.query.criteria.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Adds every condition with `and`.
    pub fn where_all<I: IntoIterator<Item = Predicate>>(self, conditions: I) -> Self {
        conditions.into_iter().fold(self, |builder, c| builder.r#where(c))
    }

    /// Adds a condition when there is one; `None` leaves the query as is.
    pub fn where_opt(self, condition: Option<Predicate>) -> Self {
        match condition {
            Some(condition) => self.r#where(condition),
            None => self,
        }
    }

    pub fn group_by(mut self, key: impl IntoScalar) -> Self {
        self.query.group_by.push(key.into_scalar_expr());
        self
    }

    pub fn having(mut self, condition: Predicate) -> Self {
        self.query.having = Some(match self.query.having.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.query.order_by.push(order);
        self
    }

    pub fn order_by_all<I: IntoIterator<Item = OrderBy>>(mut self, orders: I) -> Self {
        self.query.order_by.extend(orders);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// The same query used as an aliased column of an outer select.
    pub fn as_(self, alias: &str) -> Named<R> {
        Named::new(ScalarExpr::Subquery(Box::new(self.query)), alias)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    /// Validates the descriptor and translates it once.
    pub fn build(self) -> Result<TypedQuery<R>> {
        Analyzer::validate(&self.query)?;
        TypedQuery::new(Arc::new(self.query), self.mapper, self.config)
    }

    pub fn fetch<E: Executor + ?Sized>(self, executor: &E) -> Result<Vec<R>> {
        self.build()?.fetch(executor)
    }

    pub fn fetch_one<E: Executor + ?Sized>(self, executor: &E) -> Result<Option<R>> {
        self.build()?.fetch_one(executor)
    }

    pub fn fetch_first<E: Executor + ?Sized>(self, executor: &E) -> Result<Option<R>> {
        self.build()?.fetch_first(executor)
    }

    pub fn fetch_count<E: Executor + ?Sized>(self, executor: &E) -> Result<u64> {
        self.build()?.fetch_count(executor)
    }

    pub fn fetch_results<E: Executor + ?Sized>(self, executor: &E) -> Result<QueryResults<R>> {
        self.build()?.fetch_results(executor)
    }

    pub async fn fetch_async<E: AsyncExecutor>(self, executor: &E) -> Result<Vec<R>> {
        self.build()?.fetch_async(executor).await
    }
}
