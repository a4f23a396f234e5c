use std::{any::type_name, collections::HashSet, marker::PhantomData, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    error::{QueryError, Result},
    expr::{Expr, Named, SqlType, ValueType},
    materializer::{RowMapper, Selection, selection::column},
    query::{Identifier, IntoIdentifier, Projection, QueryBuilder},
};

/// A type that field-based projections can fill. `FIELDS` lists every
/// settable field with its declared kind.
pub trait ProjectionTarget: DeserializeOwned + Send + 'static {
    const FIELDS: &'static [(&'static str, ValueType)];
}

/// One typed column of a DTO projection.
pub trait ConstructorArg {
    type Value: SqlType;

    fn into_identifier(self) -> Identifier;
}

impl<T: SqlType> ConstructorArg for Expr<T> {
    type Value = T;

    fn into_identifier(self) -> Identifier {
        IntoIdentifier::into_identifier(self)
    }
}

impl<T: SqlType> ConstructorArg for &Expr<T> {
    type Value = T;

    fn into_identifier(self) -> Identifier {
        IntoIdentifier::into_identifier(self)
    }
}

impl<T: SqlType> ConstructorArg for Named<T> {
    type Value = T;

    fn into_identifier(self) -> Identifier {
        IntoIdentifier::into_identifier(self)
    }
}

impl<T: SqlType> ConstructorArg for QueryBuilder<T> {
    type Value = T;

    fn into_identifier(self) -> Identifier {
        IntoIdentifier::into_identifier(self)
    }
}

/// A row of values decoded positionally.
pub trait DecodeRow: Sized + Send + 'static {
    fn decode(row: &[Value]) -> Result<Self>;
}

/// A tuple of `ConstructorArg`s.
pub trait ConstructorArgs {
    type Values: DecodeRow;

    fn into_columns(self) -> Vec<(Identifier, ValueType)>;
}

macro_rules! constructor_args {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: SqlType),+> DecodeRow for ($($name,)+) {
            fn decode(row: &[Value]) -> Result<Self> {
                Ok(($($name::from_value(column(row, $idx)?)?,)+))
            }
        }

        impl<$($name: ConstructorArg),+> ConstructorArgs for ($($name,)+) {
            type Values = ($($name::Value,)+);

            fn into_columns(self) -> Vec<(Identifier, ValueType)> {
                vec![$((self.$idx.into_identifier(), <$name::Value as SqlType>::value_type())),+]
            }
        }
    };
}

constructor_args!(A: 0);
constructor_args!(A: 0, B: 1);
constructor_args!(A: 0, B: 1, C: 2);
constructor_args!(A: 0, B: 1, C: 2, D: 3);
constructor_args!(A: 0, B: 1, C: 2, D: 3, E: 4);
constructor_args!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

/// Projection filled by field name.
pub struct BeanProjection<D> {
    target: String,
    fields: Vec<Identifier>,
    names: Vec<String>,
    _target: PhantomData<fn() -> D>,
}

/// Projection filled positionally through a caller-supplied constructor.
pub struct ConstructorProjection<D> {
    target: String,
    args: Vec<Identifier>,
    mapper: RowMapper<D>,
}

pub struct Projections;

impl Projections {
    /// Fills `D` by field name. Each column's name is its alias, or the
    /// attribute name for plain paths.
    ///
    /// Fails with `ProjectionMismatch` when the columns do not cover `D`'s
    /// fields exactly or a column's type cannot be stored in its field.
    pub fn fields<D: ProjectionTarget, A: ConstructorArgs>(args: A) -> Result<BeanProjection<D>> {
        let target = short_type_name::<D>();
        let columns = args.into_columns();

        if columns.len() != D::FIELDS.len() {
            return QueryError::mismatch(format!(
                "{} has {} fields, {} columns were selected",
                target,
                D::FIELDS.len(),
                columns.len()
            ))
            .err();
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut fields = Vec::with_capacity(columns.len());
        for (identifier, ty) in columns {
            let name = identifier
                .output_name()
                .ok_or_else(|| {
                    QueryError::mismatch(format!("{} has no field name; alias it with as_", identifier.expression))
                })?
                .to_string();

            let declared = D::FIELDS
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, ty)| *ty)
                .ok_or_else(|| QueryError::mismatch(format!("{} has no field '{}'", target, name)))?;

            if !ty.is_assignable_to(declared) {
                return QueryError::mismatch(format!(
                    "{}.{} is {:?}, column is {:?}",
                    target, name, declared, ty
                ))
                .err();
            }

            if !seen.insert(name.clone()) {
                return QueryError::mismatch(format!("field '{}' selected twice", name)).err();
            }

            names.push(name);
            fields.push(identifier);
        }

        Ok(BeanProjection { target, fields, names, _target: PhantomData })
    }

    /// Setter-style population; identical to `fields` for serde-backed
    /// targets.
    pub fn bean<D: ProjectionTarget, A: ConstructorArgs>(args: A) -> Result<BeanProjection<D>> {
        Self::fields(args)
    }

    /// Builds `D` from the decoded columns, in order.
    pub fn constructor<D, A, F>(args: A, build: F) -> ConstructorProjection<D>
    where
        D: 'static,
        A: ConstructorArgs,
        F: Fn(A::Values) -> D + Send + Sync + 'static,
    {
        let args = args.into_columns().into_iter().map(|(identifier, _)| identifier).collect();
        ConstructorProjection { target: short_type_name::<D>(), args, mapper: constructor_mapper::<A::Values, D, F>(build) }
    }
}

fn constructor_mapper<V, D, F>(build: F) -> RowMapper<D>
where
    V: DecodeRow,
    D: 'static,
    F: Fn(V) -> D + Send + Sync + 'static,
{
    Arc::new(move |row: &[Value]| V::decode(row).map(&build))
}

fn bean_mapper<D: ProjectionTarget>(names: Vec<String>) -> RowMapper<D> {
    Arc::new(move |row: &[Value]| {
        let object = names
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Map<String, Value>>();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| QueryError::mismatch(format!("cannot build {}: {}", short_type_name::<D>(), e)))
    })
}

fn short_type_name<D>() -> String {
    let full = type_name::<D>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

impl<D: ProjectionTarget> Selection for BeanProjection<D> {
    type Output = D;

    fn into_selection(self) -> (Projection, RowMapper<D>) {
        let mapper = bean_mapper::<D>(self.names);
        (Projection::Bean { target: self.target, fields: self.fields }, mapper)
    }
}

impl<D> Selection for ConstructorProjection<D> {
    type Output = D;

    fn into_selection(self) -> (Projection, RowMapper<D>) {
        (Projection::Constructor { target: self.target, args: self.args }, self.mapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::QMember,
        dto::{MemberDto, UserDto},
    };
    use serde_json::json;

    #[test]
    pub fn test_fields_by_attribute_name() {
        let member = QMember::default();
        let projection = Projections::fields::<MemberDto, _>((&member.username, &member.age)).unwrap();
        let (shape, mapper) = projection.into_selection();
        assert_eq!(shape.len(), 2);

        let dto = mapper(&[json!("member1"), json!(10)]).unwrap();
        assert_eq!(dto, MemberDto::new("member1".to_string(), 10));
    }

    #[test]
    pub fn test_fields_require_matching_names() {
        let member = QMember::default();
        let result = Projections::fields::<UserDto, _>((&member.username, &member.age));
        match result {
            Err(QueryError::ProjectionMismatch(msg)) => assert!(msg.contains("no field 'username'")),
            _ => panic!("expected a projection mismatch"),
        }

        let ok = Projections::fields::<UserDto, _>((member.username.as_("name"), &member.age));
        assert!(ok.is_ok());
    }

    #[test]
    pub fn test_fields_reject_wrong_arity_and_types() {
        let member = QMember::default();
        assert!(matches!(
            Projections::fields::<MemberDto, _>((&member.username,)),
            Err(QueryError::ProjectionMismatch(_))
        ));
        assert!(matches!(
            Projections::fields::<MemberDto, _>((&member.username, member.username.as_("age"))),
            Err(QueryError::ProjectionMismatch(_))
        ));
    }

    #[test]
    pub fn test_constructor_is_positional() {
        let member = QMember::default();
        let projection =
            Projections::constructor((&member.username, &member.age), |(username, age)| UserDto::new(username, age));
        let (shape, mapper) = projection.into_selection();
        match shape {
            Projection::Constructor { target, args } => {
                assert_eq!(target, "UserDto");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(mapper(&[json!("member2"), json!(20)]).unwrap(), UserDto::new("member2".to_string(), 20));
    }
}
