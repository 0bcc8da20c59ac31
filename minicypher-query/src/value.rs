//! Runtime value model: tagged scalars with Cypher's three-valued
//! comparison, logic, and arithmetic semantics.

use crate::error::{Error, Result};
use minicypher_api::{AttrValue, EdgeKey};
use ordered_float::OrderedFloat;
use serde::ser::{SerializeMap, SerializeSeq};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Reified node/edge dictionaries and per-label aggregate results.
    Map(BTreeMap<String, Value>),
    /// One entry per parallel host edge bound to an edge variable.
    EdgeMap(Vec<EdgeEntry>),
}

/// A per-edge slot in an [`Value::EdgeMap`]: the multigraph key, the
/// edge's primary label, and the value observed on that edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEntry {
    pub key: EdgeKey,
    pub label: Option<String>,
    pub value: Value,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            // Hash by bit pattern for consistency.
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Map(m) => {
                for (k, v) in m {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::EdgeMap(entries) => {
                for entry in entries {
                    entry.key.hash(state);
                    entry.label.hash(state);
                    entry.value.hash(state);
                }
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut ser = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    ser.serialize_entry(k, v)?;
                }
                ser.end()
            }
            Value::EdgeMap(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries {
                    seq.serialize_element(&EdgeEntryRepr {
                        key: entry.key,
                        label: entry.label.as_deref(),
                        value: &entry.value,
                    })?;
                }
                seq.end()
            }
        }
    }
}

#[derive(serde::Serialize)]
struct EdgeEntryRepr<'a> {
    key: EdgeKey,
    label: Option<&'a str>,
    value: &'a Value,
}

impl From<&AttrValue> for Value {
    fn from(attr: &AttrValue) -> Self {
        match attr {
            AttrValue::Null => Value::Null,
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Int(i) => Value::Int(*i),
            AttrValue::Float(f) => Value::Float(*f),
            AttrValue::Str(s) => Value::Str(s.clone()),
            AttrValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The final WHERE gate: only a definite true keeps the row.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

/// Three-valued equality: null on either side yields null, numerics
/// coerce, otherwise strict value equality.
pub fn cypher_eq(left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    Value::Bool(eq_strict(left, right))
}

/// Two-valued structural equality with numeric coercion; null equals
/// null. Used inside lists and for membership tests.
pub fn eq_strict(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (l, r) if l.is_numeric() && r.is_numeric() => {
            match (l, r) {
                (Value::Int(a), Value::Int(b)) => a == b,
                _ => l.as_f64() == r.as_f64(),
            }
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq_strict(x, y))
        }
        (l, r) => l == r,
    }
}

/// Partial comparison for the `<`/`<=`/`>`/`>=` operators: `None` when a
/// null or a mixed-type pair makes the comparison undefined.
pub fn cypher_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (l, r) if l.is_numeric() && r.is_numeric() => match (l, r) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => OrderedFloat(l.as_f64()?).partial_cmp(&OrderedFloat(r.as_f64()?)),
        },
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order for ORDER BY buffers: nulls sort last regardless of
/// direction handling in the pipeline; values of mixed type tie.
pub fn sort_cmp(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (l, r) if l.is_numeric() && r.is_numeric() => match (l, r) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            _ => OrderedFloat(l.as_f64().unwrap()).cmp(&OrderedFloat(r.as_f64().unwrap())),
        },
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

pub fn kleene_not(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(!b),
        _ => Value::Null,
    }
}

pub fn kleene_and(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Bool(false), _) | (_, Value::Bool(false)) => Value::Bool(false),
        (Value::Bool(true), Value::Bool(true)) => Value::Bool(true),
        _ => Value::Null,
    }
}

pub fn kleene_or(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Bool(true), _) | (_, Value::Bool(true)) => Value::Bool(true),
        (Value::Bool(false), Value::Bool(false)) => Value::Bool(false),
        _ => Value::Null,
    }
}

pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(Error::Type(format!("cannot negate {}", type_name(other)))),
    }
}

pub fn arithmetic(op: &'static str, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    if !left.is_numeric() || !right.is_numeric() {
        return Err(Error::Type(format!(
            "cannot apply `{op}` to {} and {}",
            type_name(left),
            type_name(right)
        )));
    }
    let result = match (op, left, right) {
        ("+", Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        ("-", Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
        ("*", Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
        ("+", l, r) => Value::Float(l.as_f64().unwrap() + r.as_f64().unwrap()),
        ("-", l, r) => Value::Float(l.as_f64().unwrap() - r.as_f64().unwrap()),
        ("*", l, r) => Value::Float(l.as_f64().unwrap() * r.as_f64().unwrap()),
        ("/", l, r) => {
            let divisor = r.as_f64().unwrap();
            if divisor == 0.0 {
                return Ok(Value::Null);
            }
            Value::Float(l.as_f64().unwrap() / divisor)
        }
        _ => unreachable!("unknown arithmetic operator"),
    };
    Ok(result)
}

pub fn string_predicate(
    op: &'static str,
    left: &Value,
    right: &Value,
    test: impl Fn(&str, &str) -> bool,
) -> Result<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Str(l), Value::Str(r)) => Ok(Value::Bool(test(l, r))),
        (l, r) => Err(Error::Type(format!(
            "`{op}` expects strings, got {} and {}",
            type_name(l),
            type_name(r)
        ))),
    }
}

/// `x IN list`: definite hit wins, otherwise a null comparison poisons a
/// definite miss into null.
pub fn in_list(left: &Value, right: &Value) -> Result<Value> {
    let items = match right {
        Value::Null => return Ok(Value::Null),
        Value::List(items) => items,
        other => {
            return Err(Error::Type(format!(
                "`IN` expects a list, got {}",
                type_name(other)
            )));
        }
    };
    if left.is_null() {
        return Ok(Value::Null);
    }
    let mut saw_null = false;
    for item in items {
        if item.is_null() {
            saw_null = true;
        } else if eq_strict(left, item) {
            return Ok(Value::Bool(true));
        }
    }
    if saw_null {
        Ok(Value::Null)
    } else {
        Ok(Value::Bool(false))
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Int(_) => "integer",
        Value::Float(_) => "float",
        Value::Str(_) => "string",
        Value::List(_) => "list",
        Value::Map(_) => "map",
        Value::EdgeMap(_) => "edge map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equality_is_null() {
        assert_eq!(cypher_eq(&Value::Null, &Value::Null), Value::Null);
        assert_eq!(cypher_eq(&Value::Int(1), &Value::Null), Value::Null);
    }

    #[test]
    fn numeric_coercion_in_equality() {
        assert_eq!(
            cypher_eq(&Value::Int(2), &Value::Float(2.0)),
            Value::Bool(true)
        );
        assert_eq!(
            cypher_eq(&Value::Int(2), &Value::Str("2".to_string())),
            Value::Bool(false)
        );
    }

    #[test]
    fn kleene_tables() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        let n = Value::Null;
        assert_eq!(kleene_and(f.clone(), n.clone()), f);
        assert_eq!(kleene_and(t.clone(), n.clone()), n);
        assert_eq!(kleene_or(t.clone(), n.clone()), t);
        assert_eq!(kleene_or(f.clone(), n.clone()), n);
        assert_eq!(kleene_not(n.clone()), n);
    }

    #[test]
    fn division_by_zero_is_null() {
        assert_eq!(
            arithmetic("/", &Value::Int(1), &Value::Int(0)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn arithmetic_type_errors() {
        assert!(matches!(
            arithmetic("+", &Value::Str("a".to_string()), &Value::Int(1)),
            Err(Error::Type(_))
        ));
        // Null never raises.
        assert_eq!(
            arithmetic("+", &Value::Null, &Value::Int(1)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn in_list_null_poisoning() {
        let list = Value::List(vec![Value::Null, Value::Int(1)]);
        assert_eq!(in_list(&Value::Int(1), &list).unwrap(), Value::Bool(true));
        assert_eq!(in_list(&Value::Int(2), &list).unwrap(), Value::Null);
        let clean = Value::List(vec![Value::Int(1)]);
        assert_eq!(in_list(&Value::Int(2), &clean).unwrap(), Value::Bool(false));
    }

    #[test]
    fn nulls_sort_last() {
        let mut values = vec![Value::Null, Value::Int(2), Value::Int(1)];
        values.sort_by(sort_cmp);
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Null]);
    }
}
