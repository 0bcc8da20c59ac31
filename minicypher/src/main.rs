//! Command-line runner: load a host graph from JSON or CSV, execute one
//! query, print the columnar result.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use minicypher::{AttrValue, ColumnarTable, Engine, MemGraph, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minicypher", version, about = "Run Cypher queries over JSON/CSV graphs")]
struct Cli {
    /// Query text, or @FILE to read it from a file
    query: String,

    /// Graph as a JSON document ({"directed":…,"nodes":[…],"edges":[…]})
    #[arg(long, conflicts_with_all = ["nodes", "edges"])]
    graph: Option<PathBuf>,

    /// Node CSV with an `id` column; remaining columns become attributes
    #[arg(long, requires = "edges")]
    nodes: Option<PathBuf>,

    /// Edge CSV with `src`/`dst` columns; remaining columns become
    /// attributes (`__labels__` splits on `|`)
    #[arg(long, requires = "nodes")]
    edges: Option<PathBuf>,

    /// Treat the CSV graph as directed
    #[arg(long)]
    directed: bool,

    /// Treat the CSV graph as a multigraph
    #[arg(long)]
    multigraph: bool,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let query = if let Some(path) = cli.query.strip_prefix('@') {
        std::fs::read_to_string(path).with_context(|| format!("reading query file {path}"))?
    } else {
        cli.query.clone()
    };

    let graph = load_graph(&cli)?;
    log::info!(
        "loaded graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let engine = Engine::new(&graph);
    let table = engine.run(&query)?;

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        Format::Table => print_table(&table),
    }
    Ok(())
}

fn load_graph(cli: &Cli) -> Result<MemGraph> {
    if let Some(path) = &cli.graph {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading graph file {}", path.display()))?;
        return MemGraph::from_json_str(&text).context("parsing graph document");
    }
    let (Some(nodes), Some(edges)) = (&cli.nodes, &cli.edges) else {
        bail!("provide either --graph or both --nodes and --edges");
    };

    let mut graph = match (cli.directed, cli.multigraph) {
        (true, true) => MemGraph::multi_directed(),
        (true, false) => MemGraph::directed(),
        (false, true) => MemGraph::multi_undirected(),
        (false, false) => MemGraph::undirected(),
    };

    let mut reader = csv::Reader::from_path(nodes)
        .with_context(|| format!("reading node table {}", nodes.display()))?;
    let headers = reader.headers()?.clone();
    let id_col = headers
        .iter()
        .position(|h| h == "id")
        .context("node table needs an `id` column")?;
    for record in reader.records() {
        let record = record?;
        let id: u64 = record
            .get(id_col)
            .context("missing id cell")?
            .parse()
            .context("node id must be an unsigned integer")?;
        let attrs = csv_attrs(&headers, &record, &["id"]);
        graph.add_node(id, attrs);
    }

    let mut reader = csv::Reader::from_path(edges)
        .with_context(|| format!("reading edge table {}", edges.display()))?;
    let headers = reader.headers()?.clone();
    let src_col = headers
        .iter()
        .position(|h| h == "src")
        .context("edge table needs a `src` column")?;
    let dst_col = headers
        .iter()
        .position(|h| h == "dst")
        .context("edge table needs a `dst` column")?;
    for record in reader.records() {
        let record = record?;
        let src: u64 = record
            .get(src_col)
            .context("missing src cell")?
            .parse()
            .context("edge src must be an unsigned integer")?;
        let dst: u64 = record
            .get(dst_col)
            .context("missing dst cell")?
            .parse()
            .context("edge dst must be an unsigned integer")?;
        let attrs = csv_attrs(&headers, &record, &["src", "dst"]);
        graph.add_edge(src, dst, attrs);
    }

    Ok(graph)
}

/// Every non-key CSV cell becomes an attribute; cells parse as int,
/// float, bool, then string. A `__labels__` cell splits on `|`.
fn csv_attrs(
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    key_columns: &[&str],
) -> Vec<(String, AttrValue)> {
    headers
        .iter()
        .zip(record.iter())
        .filter(|(header, cell)| !key_columns.contains(header) && !cell.is_empty())
        .map(|(header, cell)| {
            let value = if header == minicypher::LABELS_ATTR {
                AttrValue::List(
                    cell.split('|')
                        .map(|label| AttrValue::Str(label.to_string()))
                        .collect(),
                )
            } else {
                parse_cell(cell)
            };
            (header.to_string(), value)
        })
        .collect()
}

fn parse_cell(cell: &str) -> AttrValue {
    if let Ok(i) = cell.parse::<i64>() {
        return AttrValue::Int(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return AttrValue::Float(f);
    }
    match cell {
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        "null" => AttrValue::Null,
        other => AttrValue::Str(other.to_string()),
    }
}

fn print_table(table: &ColumnarTable) {
    let labels: Vec<&str> = table.labels().collect();
    if labels.is_empty() {
        return;
    }
    let rows = table.row_count();
    let rendered: Vec<Vec<String>> = (0..rows)
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|(_, values)| render_value(&values[row]))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = labels.iter().map(|l| l.len()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        println!("| {} |", padded.join(" | "));
    };

    line(&labels.iter().map(|l| l.to_string()).collect::<Vec<_>>());
    println!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    );
    for row in rendered {
        line(&row);
    }
    println!("({rows} row{})", if rows == 1 { "" } else { "s" });
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Str(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
