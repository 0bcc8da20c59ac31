//! Aggregation: grouping by non-aggregate items, empty-group rules, and
//! per-label maps over parallel edges.

use minicypher_api::AttrValue;
use minicypher_graph::{MemGraph, labels};
use minicypher_query::{Engine, Value};
use std::collections::BTreeMap;

fn team() -> MemGraph {
    let mut g = MemGraph::directed();
    for (id, dept, age) in [
        (1, "eng", 30),
        (2, "eng", 40),
        (3, "ops", 25),
        (4, "ops", 35),
        (5, "ops", 45),
    ] {
        g.add_node(
            id,
            [
                ("dept".to_string(), AttrValue::Str(dept.into())),
                ("age".to_string(), AttrValue::Int(age)),
            ],
        );
    }
    g
}

#[test]
fn count_star_groups_by_plain_items() {
    let graph = team();
    let engine = Engine::new(&graph);
    let table = engine.run("MATCH (n) RETURN n.dept, COUNT(*)").unwrap();
    assert_eq!(
        table.column("n.dept").unwrap(),
        &[Value::Str("eng".into()), Value::Str("ops".into())]
    );
    assert_eq!(
        table.column("COUNT(*)").unwrap(),
        &[Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn sum_avg_min_max() {
    let graph = team();
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.dept, SUM(n.age), AVG(n.age), MIN(n.age), MAX(n.age)")
        .unwrap();
    assert_eq!(
        table.column("SUM(n.age)").unwrap(),
        &[Value::Int(70), Value::Int(105)]
    );
    assert_eq!(
        table.column("AVG(n.age)").unwrap(),
        &[Value::Float(35.0), Value::Float(35.0)]
    );
    assert_eq!(
        table.column("MIN(n.age)").unwrap(),
        &[Value::Int(30), Value::Int(25)]
    );
    assert_eq!(
        table.column("MAX(n.age)").unwrap(),
        &[Value::Int(40), Value::Int(45)]
    );
}

#[test]
fn count_expr_skips_nulls_and_sum_of_nothing_is_zero() {
    let mut graph = team();
    // A node with no age: null for COUNT(n.age) purposes.
    graph.add_node(6, [("dept".to_string(), AttrValue::Str("idle".into()))]);
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.dept, COUNT(n.age), SUM(n.age), AVG(n.age), MIN(n.age)")
        .unwrap();
    assert_eq!(
        table.column("n.dept").unwrap(),
        &[
            Value::Str("eng".into()),
            Value::Str("ops".into()),
            Value::Str("idle".into())
        ]
    );
    assert_eq!(
        table.column("COUNT(n.age)").unwrap(),
        &[Value::Int(2), Value::Int(3), Value::Int(0)]
    );
    assert_eq!(
        table.column("SUM(n.age)").unwrap(),
        &[Value::Int(70), Value::Int(105), Value::Int(0)]
    );
    assert_eq!(
        table.column("AVG(n.age)").unwrap(),
        &[Value::Float(35.0), Value::Float(35.0), Value::Null]
    );
    assert_eq!(
        table.column("MIN(n.age)").unwrap(),
        &[Value::Int(30), Value::Int(25), Value::Null]
    );
}

#[test]
fn aggregate_alias_labels_the_column() {
    let graph = team();
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.dept, COUNT(*) AS headcount")
        .unwrap();
    assert!(table.column("headcount").is_some());
}

#[test]
fn aggregates_over_parallel_edges_keep_label_structure() {
    let mut g = MemGraph::multi_directed();
    g.add_node(1, [("name".to_string(), AttrValue::Str("Alice".into()))]);
    g.add_node(2, [("name".to_string(), AttrValue::Str("Bob".into()))]);
    g.add_edge(
        1,
        2,
        [
            ("__labels__".to_string(), labels(["paid"])),
            ("amount".to_string(), AttrValue::Int(12)),
        ],
    );
    g.add_edge(
        1,
        2,
        [
            ("__labels__".to_string(), labels(["paid"])),
            ("amount".to_string(), AttrValue::Int(40)),
        ],
    );

    let engine = Engine::new(&g);
    let table = engine
        .run("MATCH (n)-[r:paid]->(m) RETURN n.name, SUM(r.amount)")
        .unwrap();
    let expected = Value::Map(BTreeMap::from([("paid".to_string(), Value::Int(52))]));
    assert_eq!(table.column("SUM(r.amount)").unwrap(), &[expected]);
}

#[test]
fn mixed_int_float_sum_promotes() {
    let mut g = MemGraph::directed();
    g.add_node(1, [("x".to_string(), AttrValue::Int(1))]);
    g.add_node(2, [("x".to_string(), AttrValue::Float(0.5))]);
    let engine = Engine::new(&g);
    let table = engine.run("MATCH (n) RETURN SUM(n.x)").unwrap();
    assert_eq!(table.column("SUM(n.x)").unwrap(), &[Value::Float(1.5)]);
}
