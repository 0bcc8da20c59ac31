//! Expression evaluation over joined rows, including aggregate
//! accumulation across a grouping set.

use crate::ast::{
    AggregateCall, AggregateFunction, BinaryOperator, Expression, UnaryOperator,
};
use crate::error::{Error, Result};
use crate::matcher::{EdgeBinding, VarBinding, VarBindings};
use crate::motif::literal_value;
use crate::value::{
    self, EdgeEntry, Value, arithmetic, cypher_cmp, cypher_eq, in_list, kleene_and, kleene_not,
    kleene_or, negate, sort_cmp, string_predicate,
};
use minicypher_api::{EdgeRef, HostGraph, labels_of};
use std::collections::BTreeMap;

/// Evaluates an expression against a single row.
pub fn eval<G: HostGraph>(expr: &Expression, row: &VarBindings, graph: &G) -> Result<Value> {
    eval_grouped(expr, std::slice::from_ref(row), graph)
}

/// Evaluates an expression against a grouping set. Aggregate calls fold
/// over every row; everything else reads the representative first row.
pub fn eval_grouped<G: HostGraph>(
    expr: &Expression,
    rows: &[VarBindings],
    graph: &G,
) -> Result<Value> {
    let row = &rows[0];
    match expr {
        Expression::Literal(literal) => Ok(literal_value(literal)),
        Expression::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_grouped(item, rows, graph)?);
            }
            Ok(Value::List(values))
        }
        Expression::Variable(name) => {
            let binding = row
                .get(name)
                .ok_or_else(|| Error::UnknownVariable(name.clone()))?;
            Ok(reify(binding, graph))
        }
        Expression::Property(pa) => {
            let binding = row
                .get(&pa.variable)
                .ok_or_else(|| Error::UnknownVariable(pa.variable.clone()))?;
            Ok(property_value(binding, &pa.property, graph))
        }
        Expression::Unary(unary) => {
            let operand = eval_grouped(&unary.operand, rows, graph)?;
            match unary.operator {
                UnaryOperator::Not => Ok(kleene_not(operand)),
                UnaryOperator::Negate => negate(&operand),
                UnaryOperator::IsNull => Ok(Value::Bool(operand.is_null())),
                UnaryOperator::IsNotNull => Ok(Value::Bool(!operand.is_null())),
            }
        }
        Expression::Binary(binary) => {
            // Both sides evaluate: null handling happens in the value
            // semantics, not by short-circuit.
            let left = eval_grouped(&binary.left, rows, graph)?;
            let right = eval_grouped(&binary.right, rows, graph)?;
            match binary.operator {
                BinaryOperator::Equals => Ok(cypher_eq(&left, &right)),
                BinaryOperator::NotEquals => Ok(kleene_not(cypher_eq(&left, &right))),
                BinaryOperator::LessThan => Ok(comparison(&left, &right, |o| o.is_lt())),
                BinaryOperator::LessEqual => Ok(comparison(&left, &right, |o| o.is_le())),
                BinaryOperator::GreaterThan => Ok(comparison(&left, &right, |o| o.is_gt())),
                BinaryOperator::GreaterEqual => Ok(comparison(&left, &right, |o| o.is_ge())),
                BinaryOperator::And => Ok(kleene_and(left, right)),
                BinaryOperator::Or => Ok(kleene_or(left, right)),
                BinaryOperator::In => in_list(&left, &right),
                BinaryOperator::StartsWith => {
                    string_predicate("STARTS WITH", &left, &right, |l, r| l.starts_with(r))
                }
                BinaryOperator::EndsWith => {
                    string_predicate("ENDS WITH", &left, &right, |l, r| l.ends_with(r))
                }
                BinaryOperator::Contains => {
                    string_predicate("CONTAINS", &left, &right, |l, r| l.contains(r))
                }
                BinaryOperator::Add => arithmetic("+", &left, &right),
                BinaryOperator::Subtract => arithmetic("-", &left, &right),
                BinaryOperator::Multiply => arithmetic("*", &left, &right),
                BinaryOperator::Divide => arithmetic("/", &left, &right),
            }
        }
        Expression::Aggregate(call) => eval_aggregate(call, rows, graph),
    }
}

fn comparison(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    match cypher_cmp(left, right) {
        Some(ordering) => Value::Bool(test(ordering)),
        None => Value::Null,
    }
}

/// `var.attr`: scalar for nodes and single simple edges; a per-edge map
/// when parallel edges are bound; a per-hop list on variable-length paths.
fn property_value<G: HostGraph>(binding: &VarBinding, property: &str, graph: &G) -> Value {
    match binding {
        VarBinding::Node(id) => graph
            .node_attrs(*id)
            .and_then(|attrs| attrs.get(property))
            .map(Value::from)
            .unwrap_or(Value::Null),
        VarBinding::Edge(edge) => edge_value(edge, graph, |instance| {
            instance_attr(instance, property, graph)
        }),
    }
}

/// Bare variables reify to dictionaries: a node's attributes plus `__id`,
/// an edge's attributes plus endpoints and key.
fn reify<G: HostGraph>(binding: &VarBinding, graph: &G) -> Value {
    match binding {
        VarBinding::Node(id) => {
            let mut map = BTreeMap::new();
            if let Some(attrs) = graph.node_attrs(*id) {
                for (k, v) in attrs {
                    map.insert(k.clone(), Value::from(v));
                }
            }
            map.insert("__id".to_string(), Value::Int(*id as i64));
            Value::Map(map)
        }
        VarBinding::Edge(edge) => edge_value(edge, graph, |instance| edge_dict(instance, graph)),
    }
}

/// Shapes a per-edge value: scalar when exactly one simple-graph edge is
/// bound, per-edge-key entries when parallel edges are, and a list of
/// per-hop values along a variable-length path.
fn edge_value<G: HostGraph>(
    edge: &EdgeBinding,
    graph: &G,
    value_of: impl Fn(&EdgeRef) -> Value,
) -> Value {
    let hop_value = |instances: &Vec<EdgeRef>| {
        if instances.len() == 1 && !graph.is_multigraph() {
            value_of(&instances[0])
        } else {
            Value::EdgeMap(
                instances
                    .iter()
                    .map(|instance| EdgeEntry {
                        key: instance.key,
                        label: primary_label(instance, graph),
                        value: value_of(instance),
                    })
                    .collect(),
            )
        }
    };
    if edge.is_single_hop() {
        hop_value(&edge.hops[0])
    } else {
        Value::List(edge.hops.iter().map(hop_value).collect())
    }
}

fn instance_attr<G: HostGraph>(instance: &EdgeRef, property: &str, graph: &G) -> Value {
    graph
        .edge_attrs(instance.src, instance.dst, instance.key)
        .and_then(|attrs| attrs.get(property))
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn edge_dict<G: HostGraph>(instance: &EdgeRef, graph: &G) -> Value {
    let mut map = BTreeMap::new();
    if let Some(attrs) = graph.edge_attrs(instance.src, instance.dst, instance.key) {
        for (k, v) in attrs {
            map.insert(k.clone(), Value::from(v));
        }
    }
    map.insert("__src".to_string(), Value::Int(instance.src as i64));
    map.insert("__dst".to_string(), Value::Int(instance.dst as i64));
    map.insert("__key".to_string(), Value::Int(instance.key as i64));
    Value::Map(map)
}

/// First label in the (sorted) label set: arbitrary but stable for the
/// whole query, as the per-edge aggregate contract requires.
fn primary_label<G: HostGraph>(instance: &EdgeRef, graph: &G) -> Option<String> {
    let attrs = graph.edge_attrs(instance.src, instance.dst, instance.key)?;
    labels_of(attrs).into_iter().next()
}

fn eval_aggregate<G: HostGraph>(
    call: &AggregateCall,
    rows: &[VarBindings],
    graph: &G,
) -> Result<Value> {
    let Some(argument) = &call.argument else {
        // COUNT(*)
        return Ok(Value::Int(rows.len() as i64));
    };

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        values.push(eval(argument, row, graph)?);
    }

    // Per-edge maps keep their parallel-edge structure: aggregate into a
    // map keyed by primary label instead of a flat scalar.
    if values.iter().any(|v| matches!(v, Value::EdgeMap(_))) {
        let mut by_label: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for v in &values {
            match v {
                Value::EdgeMap(entries) => {
                    for entry in entries {
                        by_label
                            .entry(entry.label.clone().unwrap_or_default())
                            .or_default()
                            .push(entry.value.clone());
                    }
                }
                Value::Null => {}
                other => by_label
                    .entry(String::new())
                    .or_default()
                    .push(other.clone()),
            }
        }
        let mut folded = BTreeMap::new();
        for (label, group) in by_label {
            folded.insert(label, fold(call.function, &group)?);
        }
        return Ok(Value::Map(folded));
    }

    // Variable-length edge attributes arrive as per-hop lists; every hop
    // contributes to the aggregate.
    let mut flat = Vec::new();
    for v in values {
        match v {
            Value::List(items) => flat.extend(items),
            other => flat.push(other),
        }
    }
    fold(call.function, &flat)
}

fn fold(function: AggregateFunction, values: &[Value]) -> Result<Value> {
    let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
    match function {
        AggregateFunction::Count => Ok(Value::Int(non_null.len() as i64)),
        AggregateFunction::Sum => {
            let mut int_sum: i64 = 0;
            let mut float_sum = 0.0;
            let mut saw_float = false;
            for v in &non_null {
                match v {
                    Value::Int(i) => int_sum = int_sum.wrapping_add(*i),
                    Value::Float(f) => {
                        saw_float = true;
                        float_sum += f;
                    }
                    other => {
                        return Err(Error::Type(format!(
                            "SUM over non-numeric value of type {}",
                            value::type_name(other)
                        )));
                    }
                }
            }
            if saw_float {
                Ok(Value::Float(float_sum + int_sum as f64))
            } else {
                Ok(Value::Int(int_sum))
            }
        }
        AggregateFunction::Min => Ok(non_null
            .iter()
            .min_by(|a, b| sort_cmp(a, b))
            .cloned()
            .unwrap_or(Value::Null)),
        AggregateFunction::Max => Ok(non_null
            .iter()
            .max_by(|a, b| sort_cmp(a, b))
            .cloned()
            .unwrap_or(Value::Null)),
        AggregateFunction::Avg => {
            if non_null.is_empty() {
                return Ok(Value::Null);
            }
            let mut sum = 0.0;
            for v in &non_null {
                match v {
                    Value::Int(i) => sum += *i as f64,
                    Value::Float(f) => sum += f,
                    other => {
                        return Err(Error::Type(format!(
                            "AVG over non-numeric value of type {}",
                            value::type_name(other)
                        )));
                    }
                }
            }
            Ok(Value::Float(sum / non_null.len() as f64))
        }
    }
}
