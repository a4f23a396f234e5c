use crate::{
    config::Config,
    entity::EntityPath,
    materializer::Selection,
    query::QueryBuilder,
};

/// Starting point for top-level queries. Holds the configuration every
/// query it creates is translated with.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryFactory {
    config: Config,
}

impl QueryFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn select<S: Selection>(&self, selection: S) -> QueryBuilder<S::Output> {
        QueryBuilder::new(self.config, selection)
    }

    /// `select(path).from(path)`.
    pub fn select_from<P: EntityPath>(&self, path: &P) -> QueryBuilder<P::Entity> {
        self.select(path).from(path)
    }
}

/// Entry point for subqueries. A subquery's configuration is irrelevant:
/// it is translated as part of its enclosing query.
pub struct JpaExpressions;

impl JpaExpressions {
    pub fn select<S: Selection>(selection: S) -> QueryBuilder<S::Output> {
        QueryBuilder::new(Config::default(), selection)
    }
}
