use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{QueryError, Result},
    executor::{AsyncExecutor, Executor, Row},
    expr::{Function, ScalarExpr, SqlType},
    materializer::{QueryResults, RowMapper},
    query::{Identifier, Projection, Query},
    translator::{Statement, Translator},
};

/// A validated, translated query, ready to run any number of times.
pub struct TypedQuery<R> {
    query: Arc<Query>,
    statement: Statement,
    mapper: RowMapper<R>,
    translator: Translator,
}

impl<R> Clone for TypedQuery<R> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            statement: self.statement.clone(),
            mapper: Arc::clone(&self.mapper),
            translator: self.translator,
        }
    }
}

impl<R> std::fmt::Debug for TypedQuery<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypedQuery({:?})", self.statement)
    }
}

impl<R> TypedQuery<R> {
    pub(crate) fn new(query: Arc<Query>, mapper: RowMapper<R>, config: Config) -> Result<Self> {
        let translator = Translator::new(config.dialect);
        let statement = translator.translate(&query)?;
        Ok(Self { query, statement, mapper, translator })
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    fn materialize(&self, rows: Vec<Row>) -> Result<Vec<R>> {
        let width = self.query.projection.len();
        rows.iter()
            .map(|row| {
                if row.len() != width {
                    return QueryError::mismatch(format!("expected {} columns per row, got {}", width, row.len())).err();
                }
                (self.mapper)(row.values())
            })
            .collect()
    }

    fn run<E: Executor + ?Sized>(&self, statement: &Statement, executor: &E) -> Result<Vec<Row>> {
        let rows = executor.execute(statement)?;
        debug!(query = %statement.text(), rows = rows.len(), "query executed");
        Ok(rows)
    }

    /// Every row, materialized.
    pub fn fetch<E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<R>> {
        let rows = self.run(&self.statement, executor)?;
        self.materialize(rows)
    }

    /// At most one row. More than one is an error.
    pub fn fetch_one<E: Executor + ?Sized>(&self, executor: &E) -> Result<Option<R>> {
        let mut results = self.fetch(executor)?;
        match results.len() {
            0 | 1 => Ok(results.pop()),
            count => {
                warn!(query = %self.statement.text(), count, "single result expected");
                QueryError::NonUniqueResult { count }.err()
            }
        }
    }

    /// The first row of the query run with `limit 1`.
    pub fn fetch_first<E: Executor + ?Sized>(&self, executor: &E) -> Result<Option<R>> {
        let mut first = (*self.query).clone();
        first.limit = Some(1);
        let statement = self.translator.translate(&Arc::new(first))?;
        let rows = self.run(&statement, executor)?;
        Ok(self.materialize(rows)?.into_iter().next())
    }

    /// Number of rows the query yields without paging.
    pub fn fetch_count<E: Executor + ?Sized>(&self, executor: &E) -> Result<u64> {
        if self.query.is_grouped() {
            // one row per group; order by may hold the only aggregate
            let mut groups = (*self.query).clone();
            groups.offset = None;
            groups.limit = None;
            let statement = self.translator.translate(&Arc::new(groups))?;
            return Ok(self.run(&statement, executor)?.len() as u64);
        }

        let statement = self.translator.translate(&Arc::new(count_query(&self.query)))?;
        let rows = self.run(&statement, executor)?;
        match rows.first() {
            Some(row) if row.len() == 1 => Ok(i64::from_value(&row.values()[0])?.max(0) as u64),
            Some(row) => QueryError::mismatch(format!("count query returned {} columns", row.len())).err(),
            None => Ok(0),
        }
    }

    /// One page plus the unpaged total, from two separate executions.
    pub fn fetch_results<E: Executor + ?Sized>(&self, executor: &E) -> Result<QueryResults<R>> {
        let total = self.fetch_count(executor)?;
        if total > 0 {
            warn!(query = %self.statement.text(), total, "page and total are read without a shared snapshot");
        }
        let results = if total == 0 { vec![] } else { self.fetch(executor)? };
        Ok(QueryResults {
            results,
            total,
            offset: self.query.offset.unwrap_or(0).max(0) as u64,
            limit: self.query.limit.map(|l| l.max(0) as u64),
        })
    }

    pub async fn fetch_async<E: AsyncExecutor>(&self, executor: &E) -> Result<Vec<R>> {
        let rows = executor.execute_async(self.statement.clone()).await?;
        debug!(query = %self.statement.text(), rows = rows.len(), "query executed");
        self.materialize(rows)
    }
}

/// The query without ordering or paging.
fn unpaged(query: &Query) -> Query {
    let mut unpaged = query.clone();
    unpaged.order_by.clear();
    unpaged.offset = None;
    unpaged.limit = None;
    unpaged
}

/// `count(root)` over the same sources, joins and filter.
fn count_query(query: &Query) -> Query {
    let mut count = unpaged(query);
    let counted = match query.sources.first() {
        Some(root) => ScalarExpr::Entity(root.alias().to_string()),
        None => ScalarExpr::WildCard,
    };
    count.projection = Projection::Scalar(Identifier::new(ScalarExpr::Function(Function::new("count", vec![counted]))));
    for join in &mut count.joins {
        join.fetch = false;
    }
    count
}
