use std::{fmt, sync::Arc};

use crate::{expr::Literal, query::Query};

/// Translated query text with its positional parameters, in placeholder
/// order. Keeps the descriptor it was produced from so an in-process
/// backend can run it without parsing the text.
#[derive(Clone)]
pub struct Statement {
    pub(crate) text: String,
    pub(crate) params: Vec<Literal>,
    pub(crate) query: Arc<Query>,
}

impl Statement {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Literal] {
        &self.params
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Statement({} {:?})", self.text, self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
