use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub matches: Vec<MatchClause>,
    pub where_clause: Option<Expression>,
    pub return_clause: ReturnClause,
}

/// One path pattern: nodes alternating with edges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchClause {
    pub elements: Vec<PathElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PathElement {
    Node(NodePattern),
    Edge(EdgePattern),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Option<LabelExpr>,
    pub properties: Vec<(String, Literal)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgePattern {
    pub variable: Option<String>,
    pub labels: Option<LabelExpr>,
    pub properties: Vec<(String, Literal)>,
    pub direction: EdgeDirection,
    pub hops: HopRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeDirection {
    Forward,
    Reverse,
    Either,
}

/// Hop range of an edge. A plain edge is `1..=1`; `max: None` is unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HopRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl HopRange {
    pub const SINGLE: HopRange = HopRange {
        min: 1,
        max: Some(1),
    };

    pub fn is_single(&self) -> bool {
        *self == Self::SINGLE
    }
}

/// Label expression in disjunctive normal form: the pattern matches iff
/// any one alternative (a set of required atoms) is a subset of the host
/// label set. `:A|B` yields two one-atom alternatives; `:A:B` conjoins
/// atoms within one alternative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelExpr {
    pub alternatives: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnClause {
    pub distinct: bool,
    pub items: Vec<ReturnItem>,
    pub order_by: Vec<OrderByItem>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
    /// Verbatim source text of the expression; the column label when no
    /// alias is given.
    pub text: String,
}

impl ReturnItem {
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expression {
    Literal(Literal),
    List(Vec<Expression>),
    Variable(String),
    Property(PropertyAccess),
    Binary(Box<BinaryExpression>),
    Unary(Box<UnaryExpression>),
    Aggregate(Box<AggregateCall>),
}

impl Expression {
    /// True when any node of this tree is an aggregate call.
    pub fn has_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate(_) => true,
            Expression::Literal(_) | Expression::Variable(_) | Expression::Property(_) => false,
            Expression::List(items) => items.iter().any(Expression::has_aggregate),
            Expression::Binary(b) => b.left.has_aggregate() || b.right.has_aggregate(),
            Expression::Unary(u) => u.operand.has_aggregate(),
        }
    }

    /// Walks every variable reference in the tree.
    pub fn visit_variables<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Expression::Variable(name) => visit(name),
            Expression::Property(pa) => visit(&pa.variable),
            Expression::Literal(_) => {}
            Expression::List(items) => {
                for item in items {
                    item.visit_variables(visit);
                }
            }
            Expression::Binary(b) => {
                b.left.visit_variables(visit);
                b.right.visit_variables(visit);
            }
            Expression::Unary(u) => u.operand.visit_variables(visit),
            Expression::Aggregate(call) => {
                if let Some(arg) = &call.argument {
                    arg.visit_variables(visit);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyAccess {
    pub variable: String,
    pub property: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinaryExpression {
    pub left: Expression,
    pub operator: BinaryOperator,
    pub right: Expression,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
    In,
    StartsWith,
    EndsWith,
    Contains,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Expression,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    /// `None` is `COUNT(*)`.
    pub argument: Option<Expression>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}
