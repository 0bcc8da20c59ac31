//! The result pipeline: joins embedding streams from every MATCH clause,
//! applies WHERE, projects/aggregates RETURN items, then DISTINCT,
//! ORDER BY, SKIP, LIMIT, and shapes the columnar table.

use crate::ast::{Expression, Query, SortDirection};
use crate::error::Result;
use crate::evaluator::{eval, eval_grouped};
use crate::matcher::{Embedding, MotifMatcher, VarBindings, embedding_bindings};
use crate::motif::Motif;
use crate::value::{Value, sort_cmp};
use minicypher_api::{HostGraph, NodeId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Query results as one equal-length value list per RETURN item, in
/// declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnarTable {
    columns: Vec<(String, Vec<Value>)>,
}

impl ColumnarTable {
    fn new(labels: Vec<String>) -> Self {
        Self {
            columns: labels.into_iter().map(|l| (l, Vec::new())).collect(),
        }
    }

    fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        for ((_, column), value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(l, _)| l.as_str())
    }

    pub fn column(&self, label: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, values)| values.as_slice())
    }

    pub fn columns(&self) -> &[(String, Vec<Value>)] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

impl serde::Serialize for ColumnarTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (label, values) in &self.columns {
            map.serialize_entry(label, values)?;
        }
        map.end()
    }
}

/// Runs the compiled query against the host.
///
/// `hints` is a list of alternatives (OR): each alternative pins node
/// variables (AND) across all motifs. Unbindable alternatives contribute
/// nothing; rows identical under two alternatives appear once.
pub fn execute<G: HostGraph>(
    graph: &G,
    motifs: &[Motif],
    query: &Query,
    hints: &[BTreeMap<String, NodeId>],
) -> Result<ColumnarTable> {
    let ret = &query.return_clause;
    let labels: Vec<String> = ret.items.iter().map(|i| i.label().to_string()).collect();
    let has_aggregate = ret.items.iter().any(|i| i.expression.has_aggregate());
    let has_order = !ret.order_by.is_empty();
    let skip = ret.skip.unwrap_or(0) as usize;
    let limit = ret.limit.map(|l| l as usize);

    let alternatives = pin_alternatives(motifs, hints);
    let dedup_across_hints = alternatives.len() > 1;
    let mut seen_rows: HashSet<Vec<Embedding>> = HashSet::new();
    let rows = alternatives
        .into_iter()
        .flat_map(|pins| JoinAlternative::new(graph, motifs, pins))
        .filter(move |(tuple, _)| !dedup_across_hints || seen_rows.insert(tuple.clone()))
        .map(|(_, vars)| vars);

    let mut table = ColumnarTable::new(labels);

    // No sort and no aggregation: stream and stop pulling the matcher as
    // soon as SKIP + LIMIT rows are through.
    if !has_aggregate && !has_order {
        let mut seen: HashSet<Vec<Value>> = HashSet::new();
        let mut skipped = 0usize;
        let mut taken = 0usize;
        for vars in rows {
            if let Some(predicate) = &query.where_clause
                && !eval(predicate, &vars, graph)?.is_true()
            {
                continue;
            }
            let mut out = Vec::with_capacity(ret.items.len());
            for item in &ret.items {
                out.push(eval(&item.expression, &vars, graph)?);
            }
            if ret.distinct && !seen.insert(out.clone()) {
                continue;
            }
            if skipped < skip {
                skipped += 1;
                continue;
            }
            if let Some(l) = limit
                && taken >= l
            {
                break;
            }
            table.push_row(out);
            taken += 1;
        }
        return Ok(table);
    }

    // Sorting or aggregation forces full materialization.
    let mut kept: Vec<VarBindings> = Vec::new();
    for vars in rows {
        if let Some(predicate) = &query.where_clause
            && !eval(predicate, &vars, graph)?.is_true()
        {
            continue;
        }
        kept.push(vars);
    }

    struct Projected {
        values: Vec<Value>,
        keys: Vec<Value>,
    }

    let mut projected: Vec<Projected> = Vec::new();

    if has_aggregate {
        // Group by the distinct tuple of non-aggregate items, first-seen
        // order, then fold the aggregate items per group.
        let group_items: Vec<usize> = ret
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.expression.has_aggregate())
            .map(|(i, _)| i)
            .collect();
        let mut group_order: Vec<Vec<Value>> = Vec::new();
        let mut groups: HashMap<Vec<Value>, Vec<VarBindings>> = HashMap::new();
        for vars in kept {
            let mut key = Vec::with_capacity(group_items.len());
            for &i in &group_items {
                key.push(eval(&ret.items[i].expression, &vars, graph)?);
            }
            if !groups.contains_key(&key) {
                group_order.push(key.clone());
            }
            groups.entry(key).or_default().push(vars);
        }
        for key in group_order {
            let group_rows = &groups[&key];
            let mut values = Vec::with_capacity(ret.items.len());
            for item in &ret.items {
                values.push(eval_grouped(&item.expression, group_rows, graph)?);
            }
            let keys = sort_keys(query, &values, group_rows, graph)?;
            projected.push(Projected { values, keys });
        }
    } else {
        for vars in kept {
            let mut values = Vec::with_capacity(ret.items.len());
            for item in &ret.items {
                values.push(eval(&item.expression, &vars, graph)?);
            }
            let keys = sort_keys(query, &values, std::slice::from_ref(&vars), graph)?;
            projected.push(Projected { values, keys });
        }
    }

    if ret.distinct {
        let mut seen: HashSet<Vec<Value>> = HashSet::new();
        projected.retain(|p| seen.insert(p.values.clone()));
    }

    if has_order {
        let directions: Vec<SortDirection> =
            ret.order_by.iter().map(|item| item.direction).collect();
        projected.sort_by(|a, b| {
            for (i, direction) in directions.iter().enumerate() {
                let ordering = directed_cmp(&a.keys[i], &b.keys[i], *direction);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    for p in projected
        .into_iter()
        .skip(skip)
        .take(limit.unwrap_or(usize::MAX))
    {
        table.push_row(p.values);
    }
    Ok(table)
}

/// Sort keys for one output row. A key expression matching a RETURN
/// item's alias or expression reuses the projected value, so ORDER BY
/// works on aggregated and DISTINCT output; anything else evaluates
/// against the row's bindings.
fn sort_keys<G: HostGraph>(
    query: &Query,
    values: &[Value],
    rows: &[VarBindings],
    graph: &G,
) -> Result<Vec<Value>> {
    let ret = &query.return_clause;
    let mut keys = Vec::with_capacity(ret.order_by.len());
    for order_item in &ret.order_by {
        let reused = ret.items.iter().position(|item| {
            if item.expression == order_item.expression {
                return true;
            }
            match (&order_item.expression, &item.alias) {
                (Expression::Variable(name), Some(alias)) => name == alias,
                _ => false,
            }
        });
        let key = match reused {
            Some(idx) => values[idx].clone(),
            None => eval_grouped(&order_item.expression, rows, graph)?,
        };
        keys.push(key);
    }
    Ok(keys)
}

/// Nulls sort last regardless of direction.
fn directed_cmp(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = sort_cmp(a, b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// Expands the hint list into per-motif pin maps, dropping alternatives
/// that name a variable bindable in no motif.
fn pin_alternatives(
    motifs: &[Motif],
    hints: &[BTreeMap<String, NodeId>],
) -> Vec<Vec<BTreeMap<usize, NodeId>>> {
    if hints.is_empty() {
        return vec![vec![BTreeMap::new(); motifs.len()]];
    }
    hints
        .iter()
        .filter_map(|hint| {
            let mut per_motif = vec![BTreeMap::new(); motifs.len()];
            for (var, &id) in hint {
                let mut bindable = false;
                for (m, motif) in motifs.iter().enumerate() {
                    if let Some(idx) = motif.node_index(var)
                        && !motif.nodes[idx].anonymous
                    {
                        per_motif[m].insert(idx, id);
                        bindable = true;
                    }
                }
                if !bindable {
                    return None;
                }
            }
            Some(per_motif)
        })
        .collect()
}

/// Cross-product of all motif embedding streams, nested-loop style, with
/// an on-the-fly consistency check on shared variables. The first motif
/// streams; the others are materialized once.
struct JoinAlternative<'a, G: HostGraph> {
    motifs: &'a [Motif],
    first: MotifMatcher<'a, G>,
    rest: Vec<Vec<Embedding>>,
    current: Option<Embedding>,
    odometer: Vec<usize>,
    fresh: bool,
}

impl<'a, G: HostGraph> JoinAlternative<'a, G> {
    fn new(graph: &'a G, motifs: &'a [Motif], pins: Vec<BTreeMap<usize, NodeId>>) -> Self {
        let first = MotifMatcher::new(graph, &motifs[0], &pins[0]);
        let rest: Vec<Vec<Embedding>> = motifs[1..]
            .iter()
            .zip(&pins[1..])
            .map(|(motif, motif_pins)| MotifMatcher::new(graph, motif, motif_pins).collect())
            .collect();
        let odometer = vec![0; rest.len()];
        Self {
            motifs,
            first,
            rest,
            current: None,
            odometer,
            fresh: false,
        }
    }

    fn increment(&mut self) -> bool {
        for i in (0..self.odometer.len()).rev() {
            self.odometer[i] += 1;
            if self.odometer[i] < self.rest[i].len() {
                return true;
            }
            self.odometer[i] = 0;
        }
        false
    }

    fn combine(&self) -> Option<(Vec<Embedding>, VarBindings)> {
        let mut tuple = Vec::with_capacity(1 + self.rest.len());
        tuple.push(self.current.clone()?);
        for (i, embeddings) in self.rest.iter().enumerate() {
            tuple.push(embeddings[self.odometer[i]].clone());
        }

        let mut vars = VarBindings::new();
        for (m, embedding) in tuple.iter().enumerate() {
            for (name, binding) in embedding_bindings(&self.motifs[m], embedding) {
                match vars.get(&name) {
                    Some(existing) if *existing != binding => return None,
                    _ => {
                        vars.insert(name, binding);
                    }
                }
            }
        }
        Some((tuple, vars))
    }
}

impl<'a, G: HostGraph> Iterator for JoinAlternative<'a, G> {
    type Item = (Vec<Embedding>, VarBindings);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.iter().any(|embeddings| embeddings.is_empty()) {
            return None;
        }
        loop {
            if self.current.is_none() {
                self.current = Some(self.first.next()?);
                self.odometer.iter_mut().for_each(|i| *i = 0);
                self.fresh = true;
            }
            loop {
                if !self.fresh && !self.increment() {
                    self.current = None;
                    break;
                }
                self.fresh = false;
                if let Some(row) = self.combine() {
                    return Some(row);
                }
            }
        }
    }
}
