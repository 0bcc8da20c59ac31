//! minicypher query engine
//!
//! Evaluates a Cypher subset against any in-memory host graph exposing
//! the [`minicypher_api::HostGraph`] capability trait, returning columnar
//! results keyed by the RETURN items.
//!
//! # Quick start
//!
//! ```ignore
//! use minicypher_query::Engine;
//!
//! let engine = Engine::new(&graph);
//! let table = engine.run(
//!     "MATCH (n)-[r:paid]->(m) RETURN n.name, SUM(r.amount)",
//! )?;
//! ```
//!
//! # Supported Cypher
//!
//! - Multiple `MATCH` clauses, joined on shared variables
//! - Node/edge label DNF (`:A|B`), inline property maps, anonymous nodes
//! - Directed, reversed, and undirected edges; variable length `*lo..hi`
//! - `WHERE` with three-valued logic, `IN`, `IS [NOT] NULL`,
//!   `CONTAINS`/`STARTS WITH`/`ENDS WITH`, arithmetic
//! - `RETURN` with `AS`, `DISTINCT`, aggregates (`COUNT`, `SUM`, `MIN`,
//!   `MAX`, `AVG`), `ORDER BY`, `SKIP`, `LIMIT`
//! - `//` line comments
//!
//! # Architecture
//!
//! - `parser::Parser` – Cypher text into the AST
//! - `motif` / `matcher` – MATCH patterns into lazily enumerated
//!   subgraph-isomorphic embeddings
//! - `evaluator` – expressions over bound rows
//! - `pipeline` – join, filter, aggregate, sort, paginate, shape

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod facade;
pub mod lexer;
pub mod matcher;
pub mod motif;
pub mod parser;
pub mod pipeline;
pub mod value;

pub use error::{Error, Result};
pub use facade::{Engine, Hint, PreparedQuery, prepare};
pub use pipeline::ColumnarTable;
pub use value::{EdgeEntry, Value};

/// Parses a query string into an AST.
///
/// Low-level API; most callers want [`prepare()`], which also compiles
/// motifs and validates variable references.
pub fn parse(cypher: &str) -> Result<ast::Query> {
    parser::Parser::parse(cypher)
}
