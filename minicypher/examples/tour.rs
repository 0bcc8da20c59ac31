//! A short tour: build a small payment graph, then walk through the
//! query surface. Run with `cargo run --example tour`.

use minicypher::{AttrValue, Engine, MemGraph, Result, labels};

fn main() -> Result<()> {
    let mut graph = MemGraph::multi_directed();
    for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Cara")] {
        graph.add_node(id, [("name".to_string(), AttrValue::Str(name.into()))]);
    }
    graph.add_edge(
        1,
        2,
        [
            ("__labels__".to_string(), labels(["paid"])),
            ("amount".to_string(), AttrValue::Int(12)),
        ],
    );
    graph.add_edge(
        1,
        2,
        [
            ("__labels__".to_string(), labels(["paid"])),
            ("amount".to_string(), AttrValue::Int(40)),
        ],
    );
    graph.add_edge(
        2,
        3,
        [
            ("__labels__".to_string(), labels(["paid"])),
            ("amount".to_string(), AttrValue::Int(7)),
        ],
    );

    let engine = Engine::new(&graph);

    // Single-hop pattern with an edge label.
    let table = engine.run("MATCH (a)-[:paid]->(b) RETURN a.name, b.name")?;
    println!("payers:\n{}\n", serde_json::to_string_pretty(&table).unwrap());

    // Parallel edges aggregate into per-label maps.
    let table = engine.run("MATCH (n)-[r:paid]->(m) RETURN n.name, SUM(r.amount)")?;
    println!("totals:\n{}\n", serde_json::to_string_pretty(&table).unwrap());

    // Variable-length reachability.
    let table = engine.run("MATCH (a)-[*1..2]->(b) RETURN a.name, b.name ORDER BY a.name")?;
    println!("reachable:\n{}", serde_json::to_string_pretty(&table).unwrap());

    Ok(())
}
