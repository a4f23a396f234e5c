use std::sync::Arc;

use serde_json::Value;

use crate::{
    entity::EntityPath,
    error::{QueryError, Result},
    expr::{Expr, ScalarExpr, SqlType},
    materializer::{RowMapper, decode_entity},
    query::{Identifier, Projection},
};

/// A heterogeneous result row, read back with the expressions that were
/// selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    columns: Arc<[Identifier]>,
    values: Vec<Value>,
}

impl Tuple {
    pub(crate) fn selection(identifiers: Vec<Identifier>) -> (Projection, RowMapper<Tuple>) {
        let columns: Arc<[Identifier]> = identifiers.clone().into();
        let mapper: RowMapper<Tuple> = Arc::new(move |row: &[Value]| {
            Ok(Tuple { columns: Arc::clone(&columns), values: row.to_vec() })
        });
        (Projection::Tuple(identifiers), mapper)
    }

    fn position(&self, expr: &ScalarExpr) -> Option<usize> {
        self.columns.iter().position(|c| &c.expression == expr)
    }

    /// Value of a selected expression. `None` when it was not selected, is
    /// null, or does not decode as `T`.
    pub fn get<T: SqlType>(&self, expr: &Expr<T>) -> Option<T> {
        self.try_get(expr).ok()
    }

    pub fn try_get<T: SqlType>(&self, expr: &Expr<T>) -> Result<T> {
        let index = self
            .position(expr.scalar())
            .ok_or_else(|| QueryError::mismatch(format!("{} was not selected", expr)))?;
        T::from_value(&self.values[index])
    }

    /// Value of the column selected under `alias`.
    pub fn get_named<T: SqlType>(&self, alias: &str) -> Option<T> {
        let index = self.columns.iter().position(|c| c.alias.as_deref() == Some(alias))?;
        T::from_value(&self.values[index]).ok()
    }

    /// A selected entity. `None` when it was not selected or is absent
    /// from this row (left join without a match).
    pub fn get_entity<P: EntityPath>(&self, path: &P) -> Option<P::Entity> {
        let index = self.position(&ScalarExpr::Entity(path.alias().to_string()))?;
        decode_entity::<P::Entity>(&self.values[index]).ok()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::QMember, materializer::Selection};
    use serde_json::json;

    #[test]
    pub fn test_tuple_lookup_by_expression() {
        let member = QMember::default();
        let (projection, mapper) = (&member.username, member.age.sum()).into_selection();
        assert_eq!(projection.len(), 2);

        let tuple = mapper(&[json!("member1"), json!(100)]).unwrap();
        assert_eq!(tuple.get(&member.username), Some("member1".to_string()));
        assert_eq!(tuple.get(&member.age.sum()), Some(100));
        assert_eq!(tuple.get(&member.age), None);
        assert!(matches!(tuple.try_get(&member.age), Err(QueryError::ProjectionMismatch(_))));
    }

    #[test]
    pub fn test_absent_entity_reads_as_none() {
        let member = QMember::default();
        let (_, mapper) = (&member, &member.username).into_selection();
        let tuple = mapper(&[Value::Null, json!("x")]).unwrap();
        assert!(tuple.get_entity(&member).is_none());
    }
}
