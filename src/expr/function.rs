use std::fmt;

use crate::expr::ScalarExpr;

/// A function call, aggregate or scalar. Names are stored lowercase.
#[derive(Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<ScalarExpr>,
    pub distinct: bool,
}

impl Function {
    pub fn new(name: &str, args: Vec<ScalarExpr>) -> Self {
        Self { name: name.to_ascii_lowercase(), args, distinct: false }
    }

    pub fn distinct(name: &str, args: Vec<ScalarExpr>) -> Self {
        Self { name: name.to_ascii_lowercase(), args, distinct: true }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
        if self.distinct {
            write!(f, "{}(distinct {})", self.name, args)
        } else {
            write!(f, "{}({})", self.name, args)
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self)
    }
}
