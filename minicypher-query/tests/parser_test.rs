//! Parser tests: pattern syntax, expression precedence, modifiers, and
//! error positions.

use minicypher_query::ast::*;
use minicypher_query::{Error, parse};

fn first_match(query: &Query) -> &MatchClause {
    &query.matches[0]
}

fn node_at(clause: &MatchClause, i: usize) -> &NodePattern {
    match &clause.elements[i] {
        PathElement::Node(n) => n,
        other => panic!("expected node at {i}, got {other:?}"),
    }
}

fn edge_at(clause: &MatchClause, i: usize) -> &EdgePattern {
    match &clause.elements[i] {
        PathElement::Edge(e) => e,
        other => panic!("expected edge at {i}, got {other:?}"),
    }
}

#[test]
fn parses_node_with_labels_and_properties() {
    let query = parse(r#"MATCH (n:Person|Robot {name: "Alice", age: 30}) RETURN n"#).unwrap();
    let node = node_at(first_match(&query), 0);
    assert_eq!(node.variable.as_deref(), Some("n"));
    let labels = node.labels.as_ref().unwrap();
    assert_eq!(
        labels.alternatives,
        vec![vec!["Person".to_string()], vec!["Robot".to_string()]]
    );
    assert_eq!(node.properties.len(), 2);
    assert_eq!(node.properties[0].1, Literal::String("Alice".to_string()));
    assert_eq!(node.properties[1].1, Literal::Integer(30));
}

#[test]
fn label_chain_conjoins_atoms() {
    let query = parse("MATCH (n:A:B) RETURN n").unwrap();
    let node = node_at(first_match(&query), 0);
    assert_eq!(
        node.labels.as_ref().unwrap().alternatives,
        vec![vec!["A".to_string(), "B".to_string()]]
    );
}

#[test]
fn parses_edge_directions() {
    let query = parse("MATCH (a)-[]->(b) RETURN a").unwrap();
    assert_eq!(edge_at(first_match(&query), 1).direction, EdgeDirection::Forward);

    let query = parse("MATCH (a)<-[]-(b) RETURN a").unwrap();
    assert_eq!(edge_at(first_match(&query), 1).direction, EdgeDirection::Reverse);

    let query = parse("MATCH (a)-[]-(b) RETURN a").unwrap();
    assert_eq!(edge_at(first_match(&query), 1).direction, EdgeDirection::Either);

    let query = parse("MATCH (a)-->(b) RETURN a").unwrap();
    assert_eq!(edge_at(first_match(&query), 1).direction, EdgeDirection::Forward);
}

#[test]
fn parses_edge_variable_labels_and_properties() {
    let query = parse("MATCH (a)-[r:paid|owes {amount: 5}]->(b) RETURN r").unwrap();
    let edge = edge_at(first_match(&query), 1);
    assert_eq!(edge.variable.as_deref(), Some("r"));
    assert_eq!(edge.labels.as_ref().unwrap().alternatives.len(), 2);
    assert_eq!(edge.properties[0].1, Literal::Integer(5));
    assert!(edge.hops.is_single());
}

#[test]
fn hop_range_defaults() {
    let hops = |q: &str| {
        let query = parse(q).unwrap();
        edge_at(first_match(&query), 1).hops
    };
    assert_eq!(hops("MATCH (a)-[*]->(b) RETURN a"), HopRange { min: 1, max: None });
    assert_eq!(
        hops("MATCH (a)-[*3]->(b) RETURN a"),
        HopRange { min: 3, max: Some(3) }
    );
    assert_eq!(
        hops("MATCH (a)-[*..4]->(b) RETURN a"),
        HopRange { min: 1, max: Some(4) }
    );
    assert_eq!(hops("MATCH (a)-[*2..]->(b) RETURN a"), HopRange { min: 2, max: None });
    assert_eq!(
        hops("MATCH (a)-[*2..3]->(b) RETURN a"),
        HopRange { min: 2, max: Some(3) }
    );
}

#[test]
fn chained_pattern_desugars_to_shared_nodes() {
    let query = parse("MATCH (a)-[]->(b)-[]->(c) RETURN a").unwrap();
    let clause = first_match(&query);
    assert_eq!(clause.elements.len(), 5);
    assert_eq!(node_at(clause, 2).variable.as_deref(), Some("b"));
}

#[test]
fn where_precedence_or_over_and() {
    let query = parse("MATCH (n) WHERE n.a = 1 AND n.b = 2 OR n.c = 3 RETURN n").unwrap();
    let Some(Expression::Binary(top)) = &query.where_clause else {
        panic!("expected binary WHERE");
    };
    assert_eq!(top.operator, BinaryOperator::Or);
    let Expression::Binary(left) = &top.left else {
        panic!("expected AND under OR");
    };
    assert_eq!(left.operator, BinaryOperator::And);
}

#[test]
fn not_binds_over_comparison() {
    let query = parse("MATCH (n) WHERE NOT n.a = 1 RETURN n").unwrap();
    let Some(Expression::Unary(not)) = &query.where_clause else {
        panic!("expected unary WHERE");
    };
    assert_eq!(not.operator, UnaryOperator::Not);
    assert!(matches!(&not.operand, Expression::Binary(b) if b.operator == BinaryOperator::Equals));
}

#[test]
fn is_null_postfix_and_starts_with() {
    let query = parse("MATCH (n) WHERE n.a IS NOT NULL AND n.b STARTS WITH 'x' RETURN n").unwrap();
    let Some(Expression::Binary(and)) = &query.where_clause else {
        panic!("expected AND");
    };
    assert!(
        matches!(&and.left, Expression::Unary(u) if u.operator == UnaryOperator::IsNotNull)
    );
    assert!(
        matches!(&and.right, Expression::Binary(b) if b.operator == BinaryOperator::StartsWith)
    );
}

#[test]
fn double_equals_matches_single() {
    assert_eq!(
        parse("MATCH (n) WHERE n.a == 1 RETURN n").unwrap(),
        parse("MATCH (n) WHERE n.a = 1 RETURN n").unwrap()
    );
}

#[test]
fn return_item_text_and_alias() {
    let query = parse("MATCH (n) RETURN  n.age , n.name AS name ORDER BY n.age").unwrap();
    let items = &query.return_clause.items;
    assert_eq!(items[0].text, "n.age");
    assert_eq!(items[0].label(), "n.age");
    assert_eq!(items[1].label(), "name");
    assert_eq!(query.return_clause.order_by.len(), 1);
}

#[test]
fn return_modifiers() {
    let query =
        parse("MATCH (n) RETURN DISTINCT n.age ORDER BY n.age DESC, n.name SKIP 2 LIMIT 5")
            .unwrap();
    let ret = &query.return_clause;
    assert!(ret.distinct);
    assert_eq!(ret.order_by[0].direction, SortDirection::Descending);
    assert_eq!(ret.order_by[1].direction, SortDirection::Ascending);
    assert_eq!(ret.skip, Some(2));
    assert_eq!(ret.limit, Some(5));
}

#[test]
fn aggregate_calls() {
    let query = parse("MATCH (n) RETURN COUNT(*), sum(n.age)").unwrap();
    let items = &query.return_clause.items;
    let Expression::Aggregate(count) = &items[0].expression else {
        panic!("expected aggregate");
    };
    assert_eq!(count.function, AggregateFunction::Count);
    assert!(count.argument.is_none());
    let Expression::Aggregate(sum) = &items[1].expression else {
        panic!("expected aggregate");
    };
    assert_eq!(sum.function, AggregateFunction::Sum);
    assert!(sum.argument.is_some());
}

#[test]
fn list_literal_and_in() {
    let query = parse("MATCH (n) WHERE n.age IN [25, 30.5, 'x', null] RETURN n").unwrap();
    let Some(Expression::Binary(b)) = &query.where_clause else {
        panic!("expected IN");
    };
    assert_eq!(b.operator, BinaryOperator::In);
    let Expression::List(items) = &b.right else {
        panic!("expected list literal");
    };
    assert_eq!(items.len(), 4);
}

#[test]
fn comments_are_ignored() {
    let query = parse("MATCH (n) // who\n/* what */ RETURN n").unwrap();
    assert_eq!(query.return_clause.items.len(), 1);
}

#[test]
fn parse_error_carries_position() {
    let err = parse("MATCH (n)\nRETURN").unwrap_err();
    let Error::Parse { line, .. } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(line, 2);
}

#[test]
fn missing_match_is_an_error() {
    assert!(matches!(parse("RETURN 1"), Err(Error::Parse { .. })));
}

#[test]
fn aggregate_in_where_is_an_error() {
    assert!(matches!(
        parse("MATCH (n) WHERE COUNT(*) > 1 RETURN n"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn unknown_function_is_an_error() {
    assert!(matches!(
        parse("MATCH (n) RETURN shout(n)"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn trailing_garbage_is_an_error() {
    assert!(matches!(
        parse("MATCH (n) RETURN n WITH n"),
        Err(Error::Parse { .. })
    ));
}
