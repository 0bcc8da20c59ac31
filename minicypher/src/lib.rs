//! # minicypher
//!
//! **Cypher-subset queries over in-memory attributed graphs.**
//!
//! minicypher evaluates a useful slice of the Cypher query language
//! against any host graph exposing the [`HostGraph`] capability trait:
//! pattern matching with multi-hop and undirected edges, labels,
//! property maps, hints, three-valued WHERE logic, aggregation over
//! parallel edges, `DISTINCT`, `ORDER BY`, `SKIP`, and `LIMIT`.
//!
//! ## Quickstart
//!
//! ```rust
//! use minicypher::{AttrValue, Engine, MemGraph, Value};
//!
//! let mut graph = MemGraph::directed();
//! graph.add_node(1, [("name".to_string(), AttrValue::Str("Alice".into()))]);
//! graph.add_node(2, [("name".to_string(), AttrValue::Str("Bob".into()))]);
//! graph.add_edge(1, 2, []);
//!
//! let engine = Engine::new(&graph);
//! let table = engine.run("MATCH (a)-[]->(b) RETURN a.name, b.name").unwrap();
//! assert_eq!(
//!     table.column("a.name").unwrap(),
//!     &[Value::Str("Alice".into())]
//! );
//! ```
//!
//! ## Core concepts
//!
//! - **[`HostGraph`]**: the read-only capability trait the engine
//!   consumes. Bring your own graph, or use [`MemGraph`].
//! - **[`Engine`]** / **[`prepare`]**: one-shot and prepared execution.
//! - **[`ColumnarTable`]**: results as one value list per RETURN item.
//! - **Hints**: caller-supplied variable→node pins restricting the
//!   search ([`Hint`]).

pub use minicypher_api::{
    AttrValue, Attrs, EdgeKey, EdgeRef, HostGraph, LABELS_ATTR, NodeId, labels_of,
};
pub use minicypher_graph::{MemGraph, labels};
pub use minicypher_query as query;
pub use minicypher_query::{
    ColumnarTable, EdgeEntry, Engine, Error, Hint, PreparedQuery, Result, Value, prepare,
};
