use serde::{Deserialize, Serialize};

use crate::core::statement::{Pattern, Statement};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    #[serde(rename = "NumberLiteral")]
    Number { value: f64 },
    #[serde(rename = "StringLiteral")]
    Str { value: String },
    #[serde(rename = "BooleanLiteral")]
    Bool { value: bool },
    #[serde(rename = "NullLiteral")]
    Null,
    #[serde(rename = "UndefinedLiteral")]
    Undefined,
    #[serde(rename = "Identifier")]
    Ident { name: String },
    #[serde(rename = "ThisExpression")]
    This,
    #[serde(rename = "ArrayExpression")]
    Array { elements: Vec<Expr> },
    #[serde(rename = "ObjectExpression")]
    Object { properties: Vec<ObjectMember> },
    /// `object.property`
    #[serde(rename = "MemberExpression")]
    Member { object: Box<Expr>, property: String },
    /// `object[index]`
    #[serde(rename = "ComputedMemberExpression")]
    Index { object: Box<Expr>, index: Box<Expr> },
    #[serde(rename = "CallExpression")]
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    #[serde(rename = "AssignmentExpression")]
    Assign {
        operator: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `++x`, `x++`, `--x`, `x--`
    #[serde(rename = "UpdateExpression")]
    Update {
        operator: UpdateOp,
        #[serde(default)]
        prefix: bool,
        argument: Box<Expr>,
    },
    #[serde(rename = "UnaryExpression")]
    Unary {
        operator: UnaryOp,
        argument: Box<Expr>,
    },
    #[serde(rename = "BinaryExpression")]
    Binary {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    #[serde(rename = "LogicalExpression")]
    Logical {
        operator: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    #[serde(rename = "ConditionalExpression")]
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    #[serde(rename = "FunctionExpression")]
    Function {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        kind: FunctionKind,
        params: Vec<Pattern>,
        body: Vec<Statement>,
    },
    #[serde(rename = "AwaitExpression")]
    Await { argument: Box<Expr> },
    #[serde(rename = "YieldExpression")]
    Yield {
        #[serde(default)]
        argument: Option<Box<Expr>>,
        #[serde(default)]
        delegate: bool,
    },
}

/// The four interpreted function kinds of the suspension driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    #[default]
    #[serde(rename = "function")]
    Normal,
    #[serde(rename = "generator")]
    Generator,
    #[serde(rename = "async")]
    Async,
    #[serde(rename = "asyncGenerator")]
    AsyncGenerator,
}

impl FunctionKind {
    pub fn is_async(self) -> bool {
        matches!(self, FunctionKind::Async | FunctionKind::AsyncGenerator)
    }

    pub fn is_generator(self) -> bool {
        matches!(self, FunctionKind::Generator | FunctionKind::AsyncGenerator)
    }
}

/// Object-literal member: a data property, or a `get`/`set` accessor whose
/// body is an interpreted function.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ObjectMember {
    #[serde(rename = "init")]
    Init { key: String, value: Expr },
    #[serde(rename = "get")]
    Get { key: String, body: Vec<Statement> },
    #[serde(rename = "set")]
    Set {
        key: String,
        param: Pattern,
        body: Vec<Statement>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Inc,
    #[serde(rename = "--")]
    Dec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "typeof")]
    TypeOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    Nullish,
}
