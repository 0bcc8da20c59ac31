//! Two-clause joins and hint pinning over the karate-club graph.

mod common;

use common::{club, has_arc, karate_club, node_id};
use minicypher::{Engine, Hint, Value};

#[test]
fn two_hop_join_filtered_on_club() {
    let graph = karate_club();
    let engine = Engine::new(&graph);
    let table = engine
        .run(
            r#"MATCH (A)-[]->(B) MATCH (B)-[]->(C)
               WHERE A.club == "Mr. Hi"
               RETURN A.club, B.club"#,
        )
        .unwrap();

    let a_club = table.column("A.club").unwrap();
    let b_club = table.column("B.club").unwrap();
    assert_eq!(a_club.len(), b_club.len());
    assert!(!a_club.is_empty());
    for value in a_club {
        assert_eq!(value, &Value::Str("Mr. Hi".into()));
    }
}

#[test]
fn joined_triples_are_real_two_hop_walks() {
    let graph = karate_club();
    let engine = Engine::new(&graph);
    let table = engine
        .run(
            r#"MATCH (A)-[]->(B) MATCH (B)-[]->(C)
               WHERE A.club == "Mr. Hi"
               RETURN A, B, C"#,
        )
        .unwrap();

    let a_col = table.column("A").unwrap();
    let b_col = table.column("B").unwrap();
    let c_col = table.column("C").unwrap();
    for i in 0..table.row_count() {
        let (a, b, c) = (node_id(&a_col[i]), node_id(&b_col[i]), node_id(&c_col[i]));
        assert!(has_arc(a, b), "no arc {a}->{b}");
        assert!(has_arc(b, c), "no arc {b}->{c}");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(club(a), "Mr. Hi");
    }

    // The join must produce exactly the relational result: every
    // (A,B,C) with A→B, B→C, A≠B, B≠C, and A in Mr. Hi's faction.
    let mut expected = 0usize;
    for a in 0..34u64 {
        if club(a) != "Mr. Hi" {
            continue;
        }
        for b in 0..34u64 {
            if a == b || !has_arc(a, b) {
                continue;
            }
            for c in 0..34u64 {
                if b != c && has_arc(b, c) {
                    expected += 1;
                }
            }
        }
    }
    assert_eq!(table.row_count(), expected);
}

#[test]
fn hint_pins_a_to_one_host() {
    let graph = karate_club();
    let engine = Engine::new(&graph);
    let hint = Hint::from([("A".to_string(), 1u64)]);
    let table = engine
        .run_with_hints(
            r#"MATCH (A)-[]->(B) MATCH (B)-[]->(C)
               WHERE A.club == "Mr. Hi"
               RETURN A, B, C"#,
            &[hint],
        )
        .unwrap();

    assert!(!table.is_empty());
    let a_col = table.column("A").unwrap();
    for value in a_col {
        assert_eq!(node_id(value), 1);
    }

    let mut expected = 0usize;
    for b in 0..34u64 {
        if b == 1 || !has_arc(1, b) {
            continue;
        }
        for c in 0..34u64 {
            if b != c && has_arc(b, c) {
                expected += 1;
            }
        }
    }
    assert_eq!(table.row_count(), expected);
}
