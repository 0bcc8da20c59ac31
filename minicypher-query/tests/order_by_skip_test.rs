//! ORDER BY stability and null placement, DISTINCT, SKIP, and LIMIT.

use minicypher_api::AttrValue;
use minicypher_graph::MemGraph;
use minicypher_query::{Engine, Value};

fn ages(ages: &[Option<i64>]) -> MemGraph {
    let mut g = MemGraph::directed();
    for (i, age) in ages.iter().enumerate() {
        match age {
            Some(age) => g.add_node(i as u64, [("age".to_string(), AttrValue::Int(*age))]),
            None => g.add_node(i as u64, []),
        }
    }
    g
}

#[test]
fn order_by_ascending_and_descending() {
    let graph = ages(&[Some(30), Some(10), Some(20)]);
    let engine = Engine::new(&graph);
    let asc = engine.run("MATCH (n) RETURN n.age ORDER BY n.age").unwrap();
    assert_eq!(
        asc.column("n.age").unwrap(),
        &[Value::Int(10), Value::Int(20), Value::Int(30)]
    );
    let desc = engine
        .run("MATCH (n) RETURN n.age ORDER BY n.age DESC")
        .unwrap();
    assert_eq!(
        desc.column("n.age").unwrap(),
        &[Value::Int(30), Value::Int(20), Value::Int(10)]
    );
}

#[test]
fn nulls_sort_last_in_both_directions() {
    let graph = ages(&[Some(2), None, Some(1)]);
    let engine = Engine::new(&graph);
    let asc = engine.run("MATCH (n) RETURN n.age ORDER BY n.age").unwrap();
    assert_eq!(
        asc.column("n.age").unwrap(),
        &[Value::Int(1), Value::Int(2), Value::Null]
    );
    let desc = engine
        .run("MATCH (n) RETURN n.age ORDER BY n.age DESC")
        .unwrap();
    assert_eq!(
        desc.column("n.age").unwrap(),
        &[Value::Int(2), Value::Int(1), Value::Null]
    );
}

#[test]
fn chained_keys_sort_stably() {
    let mut g = MemGraph::directed();
    for (id, dept, age) in [
        (1, "b", 20),
        (2, "a", 20),
        (3, "b", 10),
        (4, "a", 10),
    ] {
        g.add_node(
            id,
            [
                ("dept".to_string(), AttrValue::Str(dept.into())),
                ("age".to_string(), AttrValue::Int(age)),
            ],
        );
    }
    let engine = Engine::new(&g);
    let table = engine
        .run("MATCH (n) RETURN n.dept, n.age ORDER BY n.dept, n.age DESC")
        .unwrap();
    assert_eq!(
        table.column("n.dept").unwrap(),
        &[
            Value::Str("a".into()),
            Value::Str("a".into()),
            Value::Str("b".into()),
            Value::Str("b".into())
        ]
    );
    assert_eq!(
        table.column("n.age").unwrap(),
        &[Value::Int(20), Value::Int(10), Value::Int(20), Value::Int(10)]
    );
}

#[test]
fn order_by_alias() {
    let graph = ages(&[Some(3), Some(1), Some(2)]);
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.age AS years ORDER BY years")
        .unwrap();
    assert_eq!(
        table.column("years").unwrap(),
        &[Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn distinct_preserves_first_seen_order() {
    let graph = ages(&[Some(25), Some(30), Some(25), Some(40), Some(30)]);
    let engine = Engine::new(&graph);
    let table = engine.run("MATCH (n) RETURN DISTINCT n.age").unwrap();
    assert_eq!(
        table.column("n.age").unwrap(),
        &[Value::Int(25), Value::Int(30), Value::Int(40)]
    );
}

#[test]
fn distinct_is_idempotent() {
    let graph = ages(&[Some(25), Some(30), Some(25)]);
    let engine = Engine::new(&graph);
    let once = engine.run("MATCH (n) RETURN DISTINCT n.age").unwrap();
    // Already-distinct input: DISTINCT changes nothing.
    assert_eq!(once.column("n.age").unwrap().len(), 2);
}

#[test]
fn skip_applies_before_limit() {
    let graph = ages(&[Some(1), Some(2), Some(3), Some(4), Some(5)]);
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.age ORDER BY n.age SKIP 1 LIMIT 2")
        .unwrap();
    assert_eq!(
        table.column("n.age").unwrap(),
        &[Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn limit_without_order_streams() {
    let graph = ages(&[Some(1), Some(2), Some(3), Some(4), Some(5)]);
    let engine = Engine::new(&graph);
    let table = engine.run("MATCH (n) RETURN n.age LIMIT 2").unwrap();
    assert_eq!(table.row_count(), 2);

    let table = engine.run("MATCH (n) RETURN n.age LIMIT 0").unwrap();
    assert!(table.is_empty());

    let table = engine.run("MATCH (n) RETURN n.age SKIP 10").unwrap();
    assert!(table.is_empty());
}

#[test]
fn skip_beyond_rows_is_empty_not_an_error() {
    let graph = ages(&[Some(1)]);
    let engine = Engine::new(&graph);
    let table = engine
        .run("MATCH (n) RETURN n.age ORDER BY n.age SKIP 5 LIMIT 5")
        .unwrap();
    assert!(table.is_empty());
}
