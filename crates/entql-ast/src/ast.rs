//! AST types for entql commands
//!
//! Mirrors what a SQL builder library yields after parsing a single
//! statement: projections, a left-deep join chain, a filter tree and
//! literal/placeholder value nodes. Column references carry the source
//! the parser resolved them to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    /// Any other statement the parser recognised (DDL, batches, ...).
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectStatement {
    pub projection: Vec<ProjectionItem>,
    pub from: Vec<TableSource>,
    /// Flat WHERE filter list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub where_filters: Vec<Filter>,
    /// Pre-grouped WHERE clause; wins over `where_filters` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_group: Option<FilterGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionItem {
    pub expr: ProjectionExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionExpr {
    AllColumns,
    Column(ColumnRef),
    Literal(Literal),
    Function(FunctionCall),
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Operand>,
        right: Box<Operand>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// One item of the FROM clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableSource {
    Aliased(AliasedSource),
    Join(Box<Join>),
}

/// Binary join; `left` is either the start of the chain or another join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub left: TableSource,
    pub right: AliasedSource,
    #[serde(default)]
    pub on: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasedSource {
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    Table { name: String },
    Subquery(Box<SelectStatement>),
}

/// The source a column was resolved to by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSource {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ColumnSource>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub conjunction: Conjunction,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conjunction {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Group(FilterGroup),
    Comparison {
        op: ComparisonOp,
        left: Operand,
        right: Operand,
    },
    Like {
        operand: Operand,
        pattern: Operand,
        #[serde(default)]
        negated: bool,
    },
    Null {
        operand: Operand,
        #[serde(default)]
        negated: bool,
    },
    In {
        operand: Operand,
        values: InValues,
        #[serde(default)]
        negated: bool,
    },
    Function(FunctionCall),
    Not(Box<Filter>),
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
        #[serde(default)]
        negated: bool,
    },
    Exists(Box<SelectStatement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InValues {
    List(Vec<Operand>),
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Literal),
    /// Bound parameter reference, e.g. `@id`.
    Placeholder(String),
    Function(FunctionCall),
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Numeric(f64),
    Null,
    Boolean(bool),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub target: Source,
    #[serde(default)]
    pub columns: Vec<ColumnRef>,
    pub values: InsertValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertValues {
    List(Vec<Operand>),
    Select(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub target: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub target: Source,
}
