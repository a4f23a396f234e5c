use std::fmt;

/// A reference to a value inside a row.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Column {
    /// `alias.field` of an entity in scope.
    Attribute { alias: String, field: String },
    /// A value computed by an earlier stage of the in-memory pipeline
    /// (group keys, aggregate results).
    Derived { name: String },
}

impl Column {
    pub fn attribute(alias: &str, field: &str) -> Self {
        Column::Attribute { alias: alias.to_string(), field: field.to_string() }
    }

    pub fn derived(name: impl Into<String>) -> Self {
        Column::Derived { name: name.into() }
    }

    /// Row key under which the in-memory executor stores this column.
    pub fn key(&self) -> String {
        match self {
            Column::Attribute { alias, field } => format!("{alias}.{field}"),
            Column::Derived { name } => name.clone(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Attribute { alias, field } => write!(f, "{alias}.{field}"),
            Column::Derived { name } => write!(f, "{name}"),
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column({})", self)
    }
}
