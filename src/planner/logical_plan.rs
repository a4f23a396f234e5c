use crate::{
    expr::{Column, Predicate, ScalarExpr},
    planner::aggregate_call::AggregateCall,
    query::{JoinType, OrderBy},
};

#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Every document of a collection, keyed `alias.field` for each declared
    /// field.
    Scan {
        collection: String,
        alias: String,
        fields: Vec<String>,
    },

    /// Nested-loop join. Unmatched left rows of a left join get `null_keys`
    /// set to null.
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        on: Predicate,
        null_keys: Vec<String>,
    },

    /// Row filter (where or having, depending on its position).
    Filter {
        input: Box<LogicalPlan>,
        predicate: Predicate,
    },

    /// Collapses rows into groups. Without keys every row lands in one group,
    /// which exists even when the input is empty.
    Aggregate {
        input: Box<LogicalPlan>,
        group_keys: Vec<GroupKey>,
        aggs: Vec<AggregateCall>,
    },

    /// Stable sort; keys with default null ordering put nulls last.
    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<OrderBy>,
    },

    Limit {
        input: Box<LogicalPlan>,
        limit: Option<i64>,
        offset: Option<i64>,
    },

    /// Evaluates the select list into positional rows.
    Project {
        input: Box<LogicalPlan>,
        exprs: Vec<ScalarExpr>,
        fetches: Vec<Fetch>,
    },
}

/// A group key and the row keys it is stored under after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Kept under its own `alias.field` key.
    Column(Column),
    /// Every declared attribute of the entity, each under its own key.
    Entity { alias: String, fields: Vec<String> },
    /// Any other expression, under a derived name.
    Computed { expr: ScalarExpr, name: String },
}

impl GroupKey {
    pub fn keys(&self) -> Vec<String> {
        match self {
            GroupKey::Column(column) => vec![column.key()],
            GroupKey::Entity { alias, fields } => fields.iter().map(|f| format!("{}.{}", alias, f)).collect(),
            GroupKey::Computed { name, .. } => vec![name.clone()],
        }
    }

    /// The expressions evaluated per row, one per key.
    pub fn exprs(&self) -> Vec<ScalarExpr> {
        match self {
            GroupKey::Column(column) => vec![ScalarExpr::Column(column.clone())],
            GroupKey::Entity { alias, fields } => fields.iter().map(|f| ScalarExpr::column(alias, f)).collect(),
            GroupKey::Computed { expr, .. } => vec![expr.clone()],
        }
    }
}

/// A fetch-joined association, embedded into the owning entity when it is
/// projected.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    pub source_alias: String,
    pub association: String,
    pub target_alias: String,
}
