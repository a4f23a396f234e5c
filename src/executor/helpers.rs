use std::cmp::Ordering;

use serde_json::Value;

use crate::query::NullOrdering;

pub struct Helpers;

impl Helpers {
    /// Stable textual key for a tuple of values, used for grouping and
    /// distinct.
    pub fn canonical_tuple(vals: &[Value]) -> String {
        Value::Array(vals.to_vec()).to_string()
    }

    /// Sort comparator. Nulls go last unless `nulls` says otherwise, in
    /// either direction.
    pub fn cmp_for_sort(a: &Value, b: &Value, ascending: bool, nulls: NullOrdering) -> Ordering {
        let nulls_first = nulls == NullOrdering::First;
        match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => if nulls_first { Ordering::Less } else { Ordering::Greater },
            (_, Value::Null) => if nulls_first { Ordering::Greater } else { Ordering::Less },
            _ => {
                let ord = Self::cmp_values(a, b);
                if ascending { ord } else { ord.reverse() }
            }
        }
    }

    /// Total order over non-null values. Values of different kinds order
    /// by kind.
    pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
            },
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
            (lhs, rhs) => Self::type_rank(lhs).cmp(&Self::type_rank(rhs)),
        }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}
