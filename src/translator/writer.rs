use crate::{
    entity::EntityRef,
    error::{QueryError, Result},
    expr::{Column, Function, Literal, Predicate, ScalarExpr, Truth},
    query::{Direction, Identifier, Join, JoinCondition, JoinType, NullOrdering, OrderBy, Query},
    translator::Dialect,
};

/// Single-pass renderer. Parameters are numbered in the order their
/// placeholders appear in the text, subqueries included.
pub(crate) struct StatementWriter {
    dialect: Dialect,
    text: String,
    params: Vec<Literal>,
    /// Entities in scope, innermost query last.
    scopes: Vec<Vec<EntityRef>>,
}

impl StatementWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect, text: String::new(), params: vec![], scopes: vec![] }
    }

    pub fn finish(self) -> (String, Vec<Literal>) {
        (self.text, self.params)
    }

    fn push(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn query(&mut self, query: &Query) -> Result<()> {
        self.scopes.push(query.bindings().cloned().collect());

        self.push("select ");
        self.identifiers(query.projection.identifiers())?;

        self.push(" from ");
        for (i, source) in query.sources.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.source(source);
        }
        for join in &query.joins {
            self.join(join)?;
        }

        if let Some(criteria) = &query.criteria {
            self.push(" where ");
            self.predicate(criteria)?;
        }
        if !query.group_by.is_empty() {
            self.push(" group by ");
            for (i, key) in query.group_by.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.expanded(key)?;
            }
        }
        if let Some(having) = &query.having {
            self.push(" having ");
            self.predicate(having)?;
        }
        if !query.order_by.is_empty() {
            self.push(" order by ");
            for (i, order) in query.order_by.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.order(order)?;
            }
        }
        if let Some(limit) = query.limit {
            self.push(&format!(" limit {}", limit));
        }
        if let Some(offset) = query.offset {
            self.push(&format!(" offset {}", offset));
        }

        self.scopes.pop();
        Ok(())
    }

    fn identifiers(&mut self, identifiers: &[Identifier]) -> Result<()> {
        for (i, identifier) in identifiers.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expanded(&identifier.expression)?;
            if let Some(alias) = &identifier.alias {
                self.push(&format!(" as {}", alias));
            }
        }
        Ok(())
    }

    fn source(&mut self, entity: &EntityRef) {
        let name = match self.dialect {
            Dialect::Jpql => entity.entity_name(),
            Dialect::Sql => entity.table(),
        };
        self.push(&format!("{} {}", name, entity.alias()));
    }

    fn join(&mut self, join: &Join) -> Result<()> {
        self.push(match join.join_type {
            JoinType::Inner => " inner join ",
            JoinType::Left => " left join ",
        });
        match (&join.condition, self.dialect) {
            (JoinCondition::Association { source_alias, name, filter }, Dialect::Jpql) => {
                if join.fetch {
                    self.push("fetch ");
                }
                self.push(&format!("{}.{} {}", source_alias, name, join.target.alias()));
                if let Some(filter) = filter {
                    self.push(" on ");
                    self.predicate(filter)?;
                }
            }
            (JoinCondition::Association { source_alias, name, filter }, Dialect::Sql) => {
                let source = self.resolve(source_alias)?;
                let info = source.schema().association_info(name).ok_or_else(|| {
                    QueryError::unresolved(format!("{} has no association '{}'", source.entity_name(), name))
                })?;
                self.source(&join.target);
                self.push(&format!(
                    " on {}.{} = {}.{}",
                    source_alias,
                    info.local_key,
                    join.target.alias(),
                    info.target_key
                ));
                if let Some(filter) = filter {
                    self.push(" and (");
                    self.predicate(filter)?;
                    self.push(")");
                }
            }
            (JoinCondition::Theta(condition), _) => {
                self.source(&join.target);
                self.push(" on ");
                self.predicate(condition)?;
            }
        }
        Ok(())
    }

    fn order(&mut self, order: &OrderBy) -> Result<()> {
        self.expr(&order.expr)?;
        self.push(match order.direction {
            Direction::Asc => " asc",
            Direction::Desc => " desc",
        });
        match order.nulls {
            NullOrdering::Default => {}
            NullOrdering::First => self.push(" nulls first"),
            NullOrdering::Last => self.push(" nulls last"),
        }
        Ok(())
    }

    fn resolve(&self, alias: &str) -> Result<EntityRef> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|e| e.alias() == alias)
            .cloned()
            .ok_or_else(|| QueryError::unresolved(format!("alias '{}' is not bound", alias)))
    }

    fn param(&mut self, literal: &Literal) {
        if literal.is_null() {
            self.push("null");
            return;
        }
        self.params.push(literal.clone());
        match self.dialect {
            Dialect::Jpql => {
                let placeholder = format!("?{}", self.params.len());
                self.push(&placeholder);
            }
            Dialect::Sql => self.push("?"),
        }
    }

    /// Like `expr`, but a whole entity becomes its column list in SQL. Used
    /// in the select list and group by.
    fn expanded(&mut self, expr: &ScalarExpr) -> Result<()> {
        match (expr, self.dialect) {
            (ScalarExpr::Entity(alias), Dialect::Sql) => {
                let entity = self.resolve(alias)?;
                let columns = entity
                    .schema()
                    .fields
                    .keys()
                    .map(|field| format!("{}.{}", alias, field))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.push(&columns);
                Ok(())
            }
            _ => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &ScalarExpr) -> Result<()> {
        match expr {
            ScalarExpr::Literal(literal) => self.param(literal),
            ScalarExpr::Column(Column::Attribute { alias, field }) => self.push(&format!("{}.{}", alias, field)),
            ScalarExpr::Column(Column::Derived { name }) => {
                return QueryError::invalid(format!("internal column {} cannot be translated", name)).err();
            }
            ScalarExpr::Entity(alias) => match self.dialect {
                Dialect::Jpql => self.push(alias),
                Dialect::Sql => {
                    let entity = self.resolve(alias)?;
                    self.push(&format!("{}.{}", alias, entity.schema().id_field));
                }
            },
            ScalarExpr::Function(fun) => self.function(fun)?,
            ScalarExpr::Arithmetic { left, op, right } => {
                self.push("(");
                self.expr(left)?;
                self.push(&format!(" {} ", op));
                self.expr(right)?;
                self.push(")");
            }
            ScalarExpr::Case(case) => {
                self.push("case");
                for (when, then) in &case.branches {
                    self.push(" when ");
                    self.predicate(when)?;
                    self.push(" then ");
                    self.expr(then)?;
                }
                self.push(" else ");
                self.expr(&case.otherwise)?;
                self.push(" end");
            }
            ScalarExpr::Subquery(query) => {
                self.push("(");
                self.query(query)?;
                self.push(")");
            }
            ScalarExpr::WildCard => self.push("*"),
        }
        Ok(())
    }

    fn function(&mut self, fun: &Function) -> Result<()> {
        if fun.name == "str" && self.dialect == Dialect::Sql {
            self.push("cast(");
            self.args(&fun.args)?;
            self.push(" as varchar)");
            return Ok(());
        }
        self.push(&fun.name);
        self.push("(");
        if fun.distinct {
            self.push("distinct ");
        }
        self.args(&fun.args)?;
        self.push(")");
        Ok(())
    }

    fn args(&mut self, args: &[ScalarExpr]) -> Result<()> {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(arg)?;
        }
        Ok(())
    }

    fn predicate(&mut self, predicate: &Predicate) -> Result<()> {
        match predicate {
            Predicate::And(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(" and ");
                    }
                    if matches!(item, Predicate::Or(_)) {
                        self.push("(");
                        self.predicate(item)?;
                        self.push(")");
                    } else {
                        self.predicate(item)?;
                    }
                }
            }
            Predicate::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(" or ");
                    }
                    self.predicate(item)?;
                }
            }
            Predicate::Not(inner) => {
                self.push("not (");
                self.predicate(inner)?;
                self.push(")");
            }
            Predicate::Compare { left, op, right } => {
                self.expr(left)?;
                self.push(&format!(" {} ", op));
                self.expr(right)?;
            }
            Predicate::Between { expr, low, high, negated } => {
                self.expr(expr)?;
                self.push(if *negated { " not between " } else { " between " });
                self.expr(low)?;
                self.push(" and ");
                self.expr(high)?;
            }
            Predicate::IsNull { expr, negated } => {
                self.expr(expr)?;
                self.push(if *negated { " is not null" } else { " is null" });
            }
            Predicate::InList { expr, list, negated } => {
                if list.is_empty() {
                    // nothing is in an empty list
                    self.push(if *negated { "1 = 1" } else { "1 = 0" });
                    return Ok(());
                }
                self.expr(expr)?;
                self.push(if *negated { " not in (" } else { " in (" });
                self.args(list)?;
                self.push(")");
            }
            Predicate::InSubquery { expr, query, negated } => {
                self.expr(expr)?;
                self.push(if *negated { " not in (" } else { " in (" });
                self.query(query)?;
                self.push(")");
            }
            Predicate::Like { expr, pattern, negated } => {
                self.expr(expr)?;
                self.push(if *negated { " not like " } else { " like " });
                self.expr(pattern)?;
            }
            Predicate::Const3(truth) => self.push(match truth {
                Truth::True => "1 = 1",
                Truth::False => "1 = 0",
                Truth::Unknown => "1 = null",
            }),
        }
        Ok(())
    }
}
