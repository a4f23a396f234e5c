use std::sync::Arc;

use serde_json::Value;

use crate::{
    entity::{Entity, EntityPath},
    error::{QueryError, Result},
    expr::{Expr, Named, SqlType},
    materializer::Tuple,
    query::{Identifier, IntoIdentifier, Projection, QueryBuilder},
};

/// Turns one result row into a caller value. Rows reach a mapper only after
/// their arity was checked against the projection.
pub type RowMapper<R> = Arc<dyn Fn(&[Value]) -> Result<R> + Send + Sync>;

/// What a `select` accepts. The selection fixes both the projected columns
/// and the Rust type each row materializes into.
pub trait Selection {
    type Output;

    fn into_selection(self) -> (Projection, RowMapper<Self::Output>);
}

pub(crate) fn column(row: &[Value], index: usize) -> Result<&Value> {
    row.get(index)
        .ok_or_else(|| QueryError::mismatch(format!("row has no column {}", index)))
}

fn scalar_mapper<T: SqlType>() -> RowMapper<T> {
    Arc::new(|row: &[Value]| T::from_value(column(row, 0)?))
}

pub(crate) fn decode_entity<E: Entity>(value: &Value) -> Result<E> {
    match value {
        Value::Null => QueryError::mismatch(format!("{} is null in this row", E::schema().name)).err(),
        other => serde_json::from_value(other.clone())
            .map_err(|e| QueryError::mismatch(format!("cannot build {}: {}", E::schema().name, e))),
    }
}

fn entity_mapper<E: Entity>() -> RowMapper<E> {
    Arc::new(|row: &[Value]| decode_entity::<E>(column(row, 0)?))
}

impl<T: SqlType> Selection for Expr<T> {
    type Output = T;

    fn into_selection(self) -> (Projection, RowMapper<T>) {
        (Projection::Scalar(self.into_identifier()), scalar_mapper::<T>())
    }
}

impl<T: SqlType> Selection for &Expr<T> {
    type Output = T;

    fn into_selection(self) -> (Projection, RowMapper<T>) {
        (Projection::Scalar(self.into_identifier()), scalar_mapper::<T>())
    }
}

impl<T: SqlType> Selection for Named<T> {
    type Output = T;

    fn into_selection(self) -> (Projection, RowMapper<T>) {
        (Projection::Scalar(self.into_identifier()), scalar_mapper::<T>())
    }
}

impl<T: SqlType> Selection for QueryBuilder<T> {
    type Output = T;

    fn into_selection(self) -> (Projection, RowMapper<T>) {
        (Projection::Scalar(self.into_identifier()), scalar_mapper::<T>())
    }
}

impl<P: EntityPath> Selection for &P {
    type Output = P::Entity;

    fn into_selection(self) -> (Projection, RowMapper<P::Entity>) {
        (Projection::Scalar(self.into_identifier()), entity_mapper::<P::Entity>())
    }
}

impl Selection for Vec<Identifier> {
    type Output = Tuple;

    fn into_selection(self) -> (Projection, RowMapper<Tuple>) {
        Tuple::selection(self)
    }
}

macro_rules! tuple_selection {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: IntoIdentifier),+> Selection for ($($name,)+) {
            type Output = Tuple;

            fn into_selection(self) -> (Projection, RowMapper<Tuple>) {
                Tuple::selection(vec![$(self.$idx.into_identifier()),+])
            }
        }
    };
}

tuple_selection!(A: 0, B: 1);
tuple_selection!(A: 0, B: 1, C: 2);
tuple_selection!(A: 0, B: 1, C: 2, D: 3);
tuple_selection!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_selection!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
