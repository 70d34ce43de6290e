use serde::{Deserialize, Serialize};

use crate::core::expr::{Expr, FunctionKind};

/// Statement nodes, shaped after the ESTree grammar an external parser
/// emits. The evaluator consumes these; it never builds them from source.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    #[serde(rename = "ExpressionStatement")]
    Expression { expression: Expr },
    #[serde(rename = "VariableDeclaration")]
    VarDecl {
        kind: VarKind,
        declarations: Vec<Declarator>,
    },
    #[serde(rename = "FunctionDeclaration")]
    FunctionDecl {
        name: String,
        #[serde(default)]
        kind: FunctionKind,
        params: Vec<Pattern>,
        body: Vec<Statement>,
    },
    #[serde(rename = "BlockStatement")]
    Block { body: Vec<Statement> },
    #[serde(rename = "EmptyStatement")]
    Empty,
    #[serde(rename = "DebuggerStatement")]
    Debugger,
    #[serde(rename = "IfStatement")]
    If {
        test: Expr,
        consequent: Box<Statement>,
        #[serde(default)]
        alternate: Option<Box<Statement>>,
    },
    #[serde(rename = "WhileStatement")]
    While { test: Expr, body: Box<Statement> },
    #[serde(rename = "DoWhileStatement")]
    DoWhile { body: Box<Statement>, test: Expr },
    #[serde(rename = "ForStatement")]
    For {
        #[serde(default)]
        init: Option<Box<Statement>>,
        #[serde(default)]
        test: Option<Expr>,
        #[serde(default)]
        update: Option<Expr>,
        body: Box<Statement>,
    },
    #[serde(rename = "ForInStatement")]
    ForIn {
        left: ForTarget,
        right: Expr,
        body: Box<Statement>,
    },
    #[serde(rename = "ForOfStatement")]
    ForOf {
        left: ForTarget,
        right: Expr,
        #[serde(default, rename = "await")]
        awaited: bool,
        body: Box<Statement>,
    },
    #[serde(rename = "SwitchStatement")]
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    #[serde(rename = "LabeledStatement")]
    Labeled { label: String, body: Box<Statement> },
    #[serde(rename = "BreakStatement")]
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    #[serde(rename = "ContinueStatement")]
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    #[serde(rename = "ReturnStatement")]
    Return {
        #[serde(default)]
        argument: Option<Expr>,
    },
    #[serde(rename = "ThrowStatement")]
    Throw { argument: Expr },
    #[serde(rename = "TryStatement")]
    Try {
        block: Vec<Statement>,
        #[serde(default)]
        handler: Option<CatchClause>,
        #[serde(default)]
        finalizer: Option<Vec<Statement>>,
    },
    #[serde(rename = "WithStatement")]
    With { object: Expr, body: Box<Statement> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Declarator {
    pub id: Pattern,
    #[serde(default)]
    pub init: Option<Expr>,
}

/// The binding slot of a for-in/for-of head. `kind: None` assigns to an
/// existing binding instead of declaring a fresh one per iteration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForTarget {
    #[serde(default)]
    pub kind: Option<VarKind>,
    pub pattern: Pattern,
}

/// A `case test:` clause, or `default:` when `test` is absent. The
/// default clause may sit anywhere among the cases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Expr>,
    pub consequent: Vec<Statement>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default)]
    pub param: Option<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    #[serde(rename = "Identifier")]
    Identifier { name: String },
    #[serde(rename = "ObjectPattern")]
    Object { properties: Vec<ObjectPatternProp> },
    #[serde(rename = "ArrayPattern")]
    Array { elements: Vec<Option<Pattern>> },
}

/// `{ key }` shorthand when `value` is absent, `{ key: value }` otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectPatternProp {
    pub key: String,
    #[serde(default)]
    pub value: Option<Box<Pattern>>,
}

/// Deserialize a whole program body from the JSON an external parser
/// produced.
pub fn program_from_json(source: &str) -> Result<Vec<Statement>, serde_json::Error> {
    serde_json::from_str(source)
}
