use crate::query::Identifier;

/// Shape of a query's select list. The translator treats every variant as
/// a flat column list; the variant only matters to the materializer.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Scalar(Identifier),
    Tuple(Vec<Identifier>),
    /// Populate `target` by field name.
    Bean { target: String, fields: Vec<Identifier> },
    /// Populate `target` positionally.
    Constructor { target: String, args: Vec<Identifier> },
}

impl Projection {
    pub fn identifiers(&self) -> &[Identifier] {
        match self {
            Projection::Scalar(identifier) => std::slice::from_ref(identifier),
            Projection::Tuple(items) => items,
            Projection::Bean { fields, .. } => fields,
            Projection::Constructor { args, .. } => args,
        }
    }

    pub(crate) fn identifiers_mut(&mut self) -> &mut [Identifier] {
        match self {
            Projection::Scalar(identifier) => std::slice::from_mut(identifier),
            Projection::Tuple(items) => items,
            Projection::Bean { fields, .. } => fields,
            Projection::Constructor { args, .. } => args,
        }
    }

    pub fn len(&self) -> usize {
        self.identifiers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers().is_empty()
    }
}
