use std::fmt;

use crate::{
    entity::EntityPath,
    expr::{Expr, Named, ScalarExpr},
    query::QueryBuilder,
};

/// One projected column, optionally aliased.
#[derive(Clone, PartialEq)]
pub struct Identifier {
    pub expression: ScalarExpr,
    pub alias: Option<String>,
}

impl Identifier {
    pub fn new(expression: ScalarExpr) -> Self {
        Self { expression, alias: None }
    }

    pub fn aliased(expression: ScalarExpr, alias: &str) -> Self {
        Self { expression, alias: Some(alias.to_string()) }
    }

    /// Name a bean projection fills from this column: the alias, or the
    /// attribute name for plain paths.
    pub fn output_name(&self) -> Option<&str> {
        match (&self.alias, &self.expression) {
            (Some(alias), _) => Some(alias),
            (None, ScalarExpr::Column(crate::expr::Column::Attribute { field, .. })) => Some(field),
            _ => None,
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.expression, alias),
            None => write!(f, "{}", self.expression),
        }
    }
}

/// Anything that can be a column of a tuple projection.
pub trait IntoIdentifier {
    fn into_identifier(self) -> Identifier;
}

impl IntoIdentifier for Identifier {
    fn into_identifier(self) -> Identifier {
        self
    }
}

impl<T> IntoIdentifier for Expr<T> {
    fn into_identifier(self) -> Identifier {
        Identifier::new(self.into_scalar())
    }
}

impl<T> IntoIdentifier for &Expr<T> {
    fn into_identifier(self) -> Identifier {
        Identifier::new(self.scalar().clone())
    }
}

impl<T> IntoIdentifier for Named<T> {
    fn into_identifier(self) -> Identifier {
        Identifier { expression: self.expr, alias: Some(self.alias) }
    }
}

impl<P: EntityPath> IntoIdentifier for &P {
    fn into_identifier(self) -> Identifier {
        Identifier::new(ScalarExpr::Entity(self.alias().to_string()))
    }
}

impl<R> IntoIdentifier for QueryBuilder<R> {
    fn into_identifier(self) -> Identifier {
        Identifier::new(ScalarExpr::Subquery(Box::new(self.into_query())))
    }
}
