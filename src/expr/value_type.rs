use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse value kind used for attribute declarations and type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// A whole entity.
    Object,
    Array,
}

impl ValueType {
    pub fn of_value(v: &Value) -> ValueType {
        match v {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ValueType::Int
                } else {
                    ValueType::Float
                }
            }
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Common type of two branches or operands. `Int` and `Float` widen to
    /// `Float`; `Null` yields to the other side.
    pub fn promote(a: ValueType, b: ValueType) -> ValueType {
        use ValueType::*;
        if a == b {
            return a;
        }
        match (a, b) {
            (Int, Float) | (Float, Int) => Float,
            (Null, y) => y,
            (x, _) => x,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// Types that support `<`, `>` and friends.
    pub fn is_ordered(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float | ValueType::String)
    }

    /// Whether two operand types may meet in a comparison, a case result or
    /// an in-list.
    pub fn is_comparable_with(&self, other: ValueType) -> bool {
        *self == other
            || *self == ValueType::Null
            || other == ValueType::Null
            || (self.is_numeric() && other.is_numeric())
    }

    /// Whether a value of `self` may be stored into a slot declared as
    /// `target`. Integers widen into floats; null fits anywhere.
    pub fn is_assignable_to(&self, target: ValueType) -> bool {
        *self == target || *self == ValueType::Null || (*self == ValueType::Int && target == ValueType::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::ValueType::*;
    use super::*;
    use serde_json::json;

    #[test]
    pub fn test_of_value() {
        assert_eq!(ValueType::of_value(&json!(1)), Int);
        assert_eq!(ValueType::of_value(&json!(1.5)), Float);
        assert_eq!(ValueType::of_value(&json!("a")), String);
        assert_eq!(ValueType::of_value(&json!({})), Object);
    }

    #[test]
    pub fn test_promotion_and_compatibility() {
        assert_eq!(ValueType::promote(Int, Float), Float);
        assert_eq!(ValueType::promote(Null, String), String);
        assert!(Int.is_comparable_with(Float));
        assert!(!String.is_comparable_with(Int));
        assert!(Int.is_assignable_to(Float));
        assert!(!Float.is_assignable_to(Int));
    }
}
