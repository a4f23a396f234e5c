use crate::expr::ScalarExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Placement of nulls in a sort. `Default` leaves it to the backend and
/// emits nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: ScalarExpr,
    pub direction: Direction,
    pub nulls: NullOrdering,
}

impl OrderBy {
    pub fn asc(expr: ScalarExpr) -> Self {
        Self { expr, direction: Direction::Asc, nulls: NullOrdering::Default }
    }

    pub fn desc(expr: ScalarExpr) -> Self {
        Self { expr, direction: Direction::Desc, nulls: NullOrdering::Default }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }

    pub fn ascending(&self) -> bool {
        self.direction == Direction::Asc
    }
}
