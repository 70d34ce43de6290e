//! Shared AST builders for the integration tests. An external parser
//! would normally produce these nodes; the builders keep test programs
//! readable without one.
#![allow(dead_code)]

use jsexec::*;

// ── expressions ────────────────────────────────────────────────────────

pub fn num(value: f64) -> Expr {
    Expr::Number { value }
}

pub fn str_(value: &str) -> Expr {
    Expr::Str { value: value.to_string() }
}

pub fn boolean(value: bool) -> Expr {
    Expr::Bool { value }
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident { name: name.to_string() }
}

pub fn this() -> Expr {
    Expr::This
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array { elements }
}

pub fn object(properties: Vec<ObjectMember>) -> Expr {
    Expr::Object { properties }
}

pub fn prop(key: &str, value: Expr) -> ObjectMember {
    ObjectMember::Init { key: key.to_string(), value }
}

pub fn getter(key: &str, body: Vec<Statement>) -> ObjectMember {
    ObjectMember::Get { key: key.to_string(), body }
}

pub fn setter(key: &str, param: &str, body: Vec<Statement>) -> ObjectMember {
    ObjectMember::Set {
        key: key.to_string(),
        param: pat(param),
        body,
    }
}

pub fn member(object: Expr, property: &str) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: property.to_string(),
    }
}

pub fn index(object: Expr, idx: Expr) -> Expr {
    Expr::Index {
        object: Box::new(object),
        index: Box::new(idx),
    }
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        arguments,
    }
}

pub fn method(object: Expr, name: &str, arguments: Vec<Expr>) -> Expr {
    call(member(object, name), arguments)
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    Expr::Assign {
        operator: AssignOp::Assign,
        target: Box::new(target),
        value: Box::new(value),
    }
}

pub fn add_assign(target: Expr, value: Expr) -> Expr {
    Expr::Assign {
        operator: AssignOp::Add,
        target: Box::new(target),
        value: Box::new(value),
    }
}

pub fn inc(target: Expr) -> Expr {
    Expr::Update {
        operator: UpdateOp::Inc,
        prefix: false,
        argument: Box::new(target),
    }
}

pub fn binary(operator: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn lt(l: Expr, r: Expr) -> Expr {
    binary(BinaryOp::Lt, l, r)
}

pub fn add(l: Expr, r: Expr) -> Expr {
    binary(BinaryOp::Add, l, r)
}

pub fn eq(l: Expr, r: Expr) -> Expr {
    binary(BinaryOp::StrictEq, l, r)
}

pub fn not(e: Expr) -> Expr {
    Expr::Unary {
        operator: UnaryOp::Not,
        argument: Box::new(e),
    }
}

pub fn func(kind: FunctionKind, params: Vec<Pattern>, body: Vec<Statement>) -> Expr {
    Expr::Function {
        name: None,
        kind,
        params,
        body,
    }
}

pub fn closure(body: Vec<Statement>) -> Expr {
    func(FunctionKind::Normal, vec![], body)
}

pub fn await_(e: Expr) -> Expr {
    Expr::Await { argument: Box::new(e) }
}

pub fn yield_(e: Expr) -> Expr {
    Expr::Yield {
        argument: Some(Box::new(e)),
        delegate: false,
    }
}

pub fn yield_star(e: Expr) -> Expr {
    Expr::Yield {
        argument: Some(Box::new(e)),
        delegate: true,
    }
}

// ── statements ─────────────────────────────────────────────────────────

pub fn pat(name: &str) -> Pattern {
    Pattern::Identifier { name: name.to_string() }
}

pub fn expr_stmt(expression: Expr) -> Statement {
    Statement::Expression { expression }
}

fn decl(kind: VarKind, name: &str, init: Option<Expr>) -> Statement {
    Statement::VarDecl {
        kind,
        declarations: vec![Declarator { id: pat(name), init }],
    }
}

pub fn let_(name: &str, init: Expr) -> Statement {
    decl(VarKind::Let, name, Some(init))
}

pub fn var_(name: &str, init: Expr) -> Statement {
    decl(VarKind::Var, name, Some(init))
}

pub fn const_(name: &str, init: Expr) -> Statement {
    decl(VarKind::Const, name, Some(init))
}

pub fn const_pat(pattern: Pattern, init: Expr) -> Statement {
    Statement::VarDecl {
        kind: VarKind::Const,
        declarations: vec![Declarator { id: pattern, init: Some(init) }],
    }
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block { body }
}

pub fn if_(test: Expr, consequent: Statement) -> Statement {
    Statement::If {
        test,
        consequent: Box::new(consequent),
        alternate: None,
    }
}

pub fn if_else(test: Expr, consequent: Statement, alternate: Statement) -> Statement {
    Statement::If {
        test,
        consequent: Box::new(consequent),
        alternate: Some(Box::new(alternate)),
    }
}

pub fn while_(test: Expr, body: Statement) -> Statement {
    Statement::While { test, body: Box::new(body) }
}

pub fn do_while(body: Statement, test: Expr) -> Statement {
    Statement::DoWhile { body: Box::new(body), test }
}

pub fn for_(init: Option<Statement>, test: Option<Expr>, update: Option<Expr>, body: Statement) -> Statement {
    Statement::For {
        init: init.map(Box::new),
        test,
        update,
        body: Box::new(body),
    }
}

pub fn for_in(kind: VarKind, name: &str, right: Expr, body: Statement) -> Statement {
    Statement::ForIn {
        left: ForTarget {
            kind: Some(kind),
            pattern: pat(name),
        },
        right,
        body: Box::new(body),
    }
}

pub fn for_of(kind: VarKind, name: &str, right: Expr, body: Statement) -> Statement {
    Statement::ForOf {
        left: ForTarget {
            kind: Some(kind),
            pattern: pat(name),
        },
        right,
        awaited: false,
        body: Box::new(body),
    }
}

pub fn for_of_pat(kind: VarKind, pattern: Pattern, right: Expr, body: Statement) -> Statement {
    Statement::ForOf {
        left: ForTarget { kind: Some(kind), pattern },
        right,
        awaited: false,
        body: Box::new(body),
    }
}

pub fn for_await(kind: VarKind, name: &str, right: Expr, body: Statement) -> Statement {
    Statement::ForOf {
        left: ForTarget {
            kind: Some(kind),
            pattern: pat(name),
        },
        right,
        awaited: true,
        body: Box::new(body),
    }
}

pub fn labeled(label: &str, body: Statement) -> Statement {
    Statement::Labeled {
        label: label.to_string(),
        body: Box::new(body),
    }
}

pub fn brk(label: Option<&str>) -> Statement {
    Statement::Break {
        label: label.map(|s| s.to_string()),
    }
}

pub fn cont(label: Option<&str>) -> Statement {
    Statement::Continue {
        label: label.map(|s| s.to_string()),
    }
}

pub fn ret(argument: Option<Expr>) -> Statement {
    Statement::Return { argument }
}

pub fn throw(argument: Expr) -> Statement {
    Statement::Throw { argument }
}

pub fn try_catch(block: Vec<Statement>, param: Option<Pattern>, catch_body: Vec<Statement>) -> Statement {
    Statement::Try {
        block,
        handler: Some(CatchClause { param, body: catch_body }),
        finalizer: None,
    }
}

pub fn try_finally(block: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    Statement::Try {
        block,
        handler: None,
        finalizer: Some(finalizer),
    }
}

pub fn try_catch_finally(
    block: Vec<Statement>,
    param: Option<Pattern>,
    catch_body: Vec<Statement>,
    finalizer: Vec<Statement>,
) -> Statement {
    Statement::Try {
        block,
        handler: Some(CatchClause { param, body: catch_body }),
        finalizer: Some(finalizer),
    }
}

pub fn with_(object: Expr, body: Statement) -> Statement {
    Statement::With {
        object,
        body: Box::new(body),
    }
}

pub fn switch(discriminant: Expr, cases: Vec<SwitchCase>) -> Statement {
    Statement::Switch { discriminant, cases }
}

pub fn case(test: Expr, consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        consequent,
    }
}

pub fn default_case(consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase { test: None, consequent }
}

pub fn fn_decl(name: &str, params: Vec<Pattern>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDecl {
        name: name.to_string(),
        kind: FunctionKind::Normal,
        params,
        body,
    }
}

pub fn gen_decl(name: &str, params: Vec<Pattern>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDecl {
        name: name.to_string(),
        kind: FunctionKind::Generator,
        params,
        body,
    }
}

pub fn async_decl(name: &str, params: Vec<Pattern>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDecl {
        name: name.to_string(),
        kind: FunctionKind::Async,
        params,
        body,
    }
}

pub fn async_gen_decl(name: &str, params: Vec<Pattern>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDecl {
        name: name.to_string(),
        kind: FunctionKind::AsyncGenerator,
        params,
        body,
    }
}

/// `out.push(value)` — the tests' result channel.
pub fn push_out(value: Expr) -> Statement {
    expr_stmt(method(ident("out"), "push", vec![value]))
}

// ── harness ────────────────────────────────────────────────────────────

/// Run a program in a fresh realm with an `out` array global; returns
/// the realm and the array for assertions.
pub fn run_with_out(program: &[Statement]) -> (Realm, Value) {
    let realm = Realm::new();
    let out = Value::Object(new_array(vec![]));
    realm.define_global("out", out.clone());
    match realm.evaluate_program(program) {
        Ok(_) => (realm, out),
        Err(e) => panic!("program failed: {e:?}"),
    }
}

pub fn run_value(program: &[Statement]) -> Result<Value, JSError> {
    Realm::new().evaluate_program(program)
}

pub fn out_json(out: &Value) -> serde_json::Value {
    value_to_json(out)
}

pub fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        other => panic!("expected number, got {other:?}"),
    }
}
