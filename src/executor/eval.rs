use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::{
    executor::helpers::Helpers,
    expr::{ArithmeticOp, ComparatorOp, Function, Predicate, ScalarExpr, Truth},
};

/// Row-level evaluation for the in-memory executor. Rows are maps keyed by
/// `alias.field` plus any derived names produced by aggregation.
pub struct Eval;

impl Eval {
    pub fn eval_scalar(expr: &ScalarExpr, row: &Map<String, Value>) -> Value {
        match expr {
            ScalarExpr::Literal(l) => l.to_value(),
            ScalarExpr::Column(c) => row.get(&c.key()).cloned().unwrap_or(Value::Null),
            ScalarExpr::Entity(alias) => Self::eval_entity(alias, row),
            ScalarExpr::Function(f) => Self::eval_scalar_function(f, row),
            ScalarExpr::Arithmetic { left, op, right } => {
                Self::arithmetic(&Self::eval_scalar(left, row), *op, &Self::eval_scalar(right, row))
            }
            ScalarExpr::Case(case) => {
                for (when, then) in &case.branches {
                    if Self::eval_predicate3(when, row).is_true() {
                        return Self::eval_scalar(then, row);
                    }
                }
                Self::eval_scalar(&case.otherwise, row)
            }
            // subqueries are inlined and aggregates rewritten before evaluation
            ScalarExpr::Subquery(_) | ScalarExpr::WildCard => Value::Null,
        }
    }

    /// The entity bound to `alias` as an object, or null when every attribute
    /// is null (the missing side of a left join).
    pub fn eval_entity(alias: &str, row: &Map<String, Value>) -> Value {
        let prefix = format!("{}.", alias);
        let mut object = Map::new();
        for (key, value) in row {
            if let Some(field) = key.strip_prefix(&prefix) {
                object.insert(field.to_string(), value.clone());
            }
        }
        if object.values().all(Value::is_null) {
            Value::Null
        } else {
            Value::Object(object)
        }
    }

    fn eval_scalar_function(f: &Function, row: &Map<String, Value>) -> Value {
        let args: Vec<Value> = f.args.iter().map(|a| Self::eval_scalar(a, row)).collect();
        match (f.name.as_str(), args.as_slice()) {
            ("upper", [Value::String(s)]) => Value::String(s.to_uppercase()),
            ("lower", [Value::String(s)]) => Value::String(s.to_lowercase()),
            ("trim", [Value::String(s)]) => Value::String(s.trim().to_string()),
            ("length", [Value::String(s)]) => Value::Number((s.chars().count() as i64).into()),
            ("str", [Value::String(s)]) => Value::String(s.clone()),
            ("str", [v @ (Value::Number(_) | Value::Bool(_))]) => Value::String(v.to_string()),
            ("concat", parts) if parts.iter().all(Value::is_string) => {
                Value::String(parts.iter().filter_map(Value::as_str).collect())
            }
            ("coalesce", values) => values.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    fn arithmetic(l: &Value, op: ArithmeticOp, r: &Value) -> Value {
        let (Value::Number(a), Value::Number(b)) = (l, r) else {
            return Value::Null;
        };
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            let result = match op {
                ArithmeticOp::Add => x.checked_add(y),
                ArithmeticOp::Sub => x.checked_sub(y),
                ArithmeticOp::Mul => x.checked_mul(y),
                ArithmeticOp::Div => x.checked_div(y),
            };
            return result.map(|v| Value::Number(v.into())).unwrap_or(Value::Null);
        }
        let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
            return Value::Null;
        };
        let result = match op {
            ArithmeticOp::Add => x + y,
            ArithmeticOp::Sub => x - y,
            ArithmeticOp::Mul => x * y,
            ArithmeticOp::Div => x / y,
        };
        Self::json_f(result)
    }

    pub fn eval_predicate3(predicate: &Predicate, row: &Map<String, Value>) -> Truth {
        match predicate {
            Predicate::And(v) => v.iter().fold(Truth::True, |acc, x| acc.and(Self::eval_predicate3(x, row))),
            Predicate::Or(v) => v.iter().fold(Truth::False, |acc, x| acc.or(Self::eval_predicate3(x, row))),
            Predicate::Not(inner) => Self::eval_predicate3(inner, row).not(),
            Predicate::Compare { left, op, right } => {
                let l = Self::eval_scalar(left, row);
                let r = Self::eval_scalar(right, row);
                Self::lit_cmp3(&l, *op, &r)
            }
            Predicate::Between { expr, low, high, negated } => {
                let v = Self::eval_scalar(expr, row);
                let t = Self::lit_cmp3(&v, ComparatorOp::GtEq, &Self::eval_scalar(low, row))
                    .and(Self::lit_cmp3(&v, ComparatorOp::LtEq, &Self::eval_scalar(high, row)));
                if *negated { t.not() } else { t }
            }
            Predicate::IsNull { expr, negated } => {
                let t = Truth::from(Self::eval_scalar(expr, row).is_null());
                if *negated { t.not() } else { t }
            }
            Predicate::InList { expr, list, negated } => {
                let v = Self::eval_scalar(expr, row);
                let values: Vec<Value> = list.iter().map(|e| Self::eval_scalar(e, row)).collect();
                let t = Self::in_values(&v, &values);
                if *negated { t.not() } else { t }
            }
            // inlined before evaluation
            Predicate::InSubquery { .. } => Truth::Unknown,
            Predicate::Like { expr, pattern, negated } => {
                let t = match (Self::eval_scalar(expr, row), Self::eval_scalar(pattern, row)) {
                    (Value::String(s), Value::String(pat)) => Self::eval_like(&s, &pat),
                    _ => Truth::Unknown,
                };
                if *negated { t.not() } else { t }
            }
            Predicate::Const3(t) => *t,
        }
    }

    /// `v in (values)` under three-valued logic.
    pub fn in_values(v: &Value, values: &[Value]) -> Truth {
        if v.is_null() {
            return if values.is_empty() { Truth::False } else { Truth::Unknown };
        }
        let mut has_null = false;
        for candidate in values {
            if candidate.is_null() {
                has_null = true;
            } else if Self::value_equal(v, candidate) {
                return Truth::True;
            }
        }
        if has_null { Truth::Unknown } else { Truth::False }
    }

    /// `%` matches any run, `_` one character, `\` escapes the next one.
    pub fn eval_like(s: &str, pattern: &str) -> Truth {
        let mut regex = String::from("^");
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => regex.push_str("(?s:.*)"),
                '_' => regex.push_str("(?s:.)"),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        regex.push_str(&regex::escape(&escaped.to_string()));
                    }
                }
                other => regex.push_str(&regex::escape(&other.to_string())),
            }
        }
        regex.push('$');
        match Regex::new(&regex) {
            Ok(re) => Truth::from(re.is_match(s)),
            Err(_) => Truth::Unknown,
        }
    }

    fn lit_cmp3(l: &Value, op: ComparatorOp, r: &Value) -> Truth {
        if l.is_null() || r.is_null() {
            return Truth::Unknown;
        }
        let ord = match (l, r) {
            (Value::Bool(_), Value::Bool(_)) | (Value::Object(_), Value::Object(_)) if !op.is_equality() => {
                return Truth::Unknown;
            }
            (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_)) => Helpers::cmp_values(l, r),
            (Value::Object(_), Value::Object(_)) => {
                if Self::value_equal(l, r) { Ordering::Equal } else { Ordering::Less }
            }
            _ => return Truth::Unknown,
        };
        Truth::from(match op {
            ComparatorOp::Eq => ord == Ordering::Equal,
            ComparatorOp::NotEq => ord != Ordering::Equal,
            ComparatorOp::Lt => ord == Ordering::Less,
            ComparatorOp::LtEq => ord != Ordering::Greater,
            ComparatorOp::Gt => ord == Ordering::Greater,
            ComparatorOp::GtEq => ord != Ordering::Less,
        })
    }

    fn json_f(f: f64) -> Value {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }

    fn value_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(_), Value::Number(_)) => Helpers::cmp_values(a, b) == Ordering::Equal,
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use crate::{
        executor::eval::Eval,
        expr::{ArithmeticOp, ComparatorOp, Literal, Predicate, ScalarExpr, Truth},
    };

    fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert((*k).to_string(), v.clone());
        }
        m
    }
    fn lit_i(i: i64) -> ScalarExpr {
        ScalarExpr::Literal(Literal::Int(i))
    }
    fn lit_s(s: &str) -> ScalarExpr {
        ScalarExpr::Literal(Literal::from(s))
    }
    fn lit_null() -> ScalarExpr {
        ScalarExpr::Literal(Literal::Null)
    }
    fn col(alias: &str, field: &str) -> ScalarExpr {
        ScalarExpr::column(alias, field)
    }

    #[test]
    fn scalar_column_lookup_and_missing_is_null() {
        let m = row(&[("member1.age", json!(10))]);
        assert_eq!(Eval::eval_scalar(&col("member1", "age"), &m), json!(10));
        assert_eq!(Eval::eval_scalar(&col("member1", "missing"), &m), Value::Null);
    }

    #[test]
    fn entity_is_rebuilt_from_prefixed_keys() {
        let m = row(&[
            ("member1.id", json!(1)),
            ("member1.username", json!("member1")),
            ("team.id", Value::Null),
            ("team.name", Value::Null),
        ]);
        assert_eq!(Eval::eval_entity("member1", &m), json!({ "id": 1, "username": "member1" }));
        assert_eq!(Eval::eval_entity("team", &m), Value::Null);
    }

    #[test]
    fn scalar_functions_and_arithmetic() {
        let m = Map::new();
        assert_eq!(Eval::eval_scalar(&ScalarExpr::function("upper", vec![lit_s("aBc")]), &m), json!("ABC"));
        assert_eq!(Eval::eval_scalar(&ScalarExpr::function("length", vec![lit_s("hé")]), &m), json!(2));
        assert_eq!(
            Eval::eval_scalar(&ScalarExpr::function("concat", vec![lit_s("member1"), lit_s("_10")]), &m),
            json!("member1_10")
        );
        assert_eq!(Eval::eval_scalar(&ScalarExpr::function("str", vec![lit_i(10)]), &m), json!("10"));
        assert_eq!(Eval::eval_scalar(&ScalarExpr::function("coalesce", vec![lit_null(), lit_i(3)]), &m), json!(3));

        let sum = ScalarExpr::Arithmetic { left: Box::new(lit_i(7)), op: ArithmeticOp::Div, right: Box::new(lit_i(2)) };
        assert_eq!(Eval::eval_scalar(&sum, &m), json!(3));
        let by_zero = ScalarExpr::Arithmetic { left: Box::new(lit_i(7)), op: ArithmeticOp::Div, right: Box::new(lit_i(0)) };
        assert_eq!(Eval::eval_scalar(&by_zero, &m), Value::Null);
    }

    #[test]
    fn comparisons_order_strings_and_treat_null_as_unknown() {
        let m = Map::new();
        let make = |l, op, r| Predicate::Compare { left: l, op, right: r };
        assert_eq!(Eval::eval_predicate3(&make(lit_s("a"), ComparatorOp::Lt, lit_s("b")), &m), Truth::True);
        assert_eq!(Eval::eval_predicate3(&make(lit_i(2), ComparatorOp::Eq, ScalarExpr::Literal(Literal::float(2.0))), &m), Truth::True);
        assert_eq!(Eval::eval_predicate3(&make(lit_null(), ComparatorOp::Eq, lit_i(1)), &m), Truth::Unknown);
    }

    #[test]
    fn between_and_not() {
        let m = row(&[("member1.age", json!(20))]);
        let between = Predicate::Between { expr: col("member1", "age"), low: lit_i(10), high: lit_i(30), negated: false };
        assert_eq!(Eval::eval_predicate3(&between, &m), Truth::True);
        assert_eq!(Eval::eval_predicate3(&between.clone().not(), &m), Truth::False);
        assert_eq!(Eval::eval_predicate3(&between.not().not(), &m), Truth::True);
    }

    #[test]
    fn in_and_not_in_with_null_semantics() {
        let m = Map::new();
        let in_list = |v, negated| Predicate::InList { expr: lit_i(v), list: vec![lit_i(1), lit_null(), lit_i(2)], negated };
        assert_eq!(Eval::eval_predicate3(&in_list(2, false), &m), Truth::True);
        assert_eq!(Eval::eval_predicate3(&in_list(3, false), &m), Truth::Unknown);
        assert_eq!(Eval::eval_predicate3(&in_list(3, true), &m), Truth::Unknown);
    }

    #[test]
    fn like_wildcards_and_escape() {
        assert_eq!(Eval::eval_like("member1", "member%"), Truth::True);
        assert_eq!(Eval::eval_like("member1", "%ber_"), Truth::True);
        assert_eq!(Eval::eval_like("a_c", "a\\_c"), Truth::True);
        assert_eq!(Eval::eval_like("abc", "a\\_c"), Truth::False);
        assert_eq!(Eval::eval_like("a.c", "abc"), Truth::False);
    }

    #[test]
    fn case_picks_first_true_branch() {
        let m = row(&[("member1.age", json!(25))]);
        let case = ScalarExpr::Case(crate::expr::CaseExpr {
            branches: vec![
                (Predicate::compare(col("member1", "age"), ComparatorOp::LtEq, lit_i(20)), lit_s("0~20")),
                (Predicate::compare(col("member1", "age"), ComparatorOp::LtEq, lit_i(30)), lit_s("21~30")),
            ],
            otherwise: Box::new(lit_s("other")),
        });
        assert_eq!(Eval::eval_scalar(&case, &m), json!("21~30"));
    }
}
