//! jsexec — the statement/control-flow evaluation core of a tree-walking
//! JavaScript interpreter, built for embedding scripts in Rust hosts.
//!
//! An external parser produces the AST (as typed values or ESTree-style
//! JSON); this crate evaluates it: the full structured-control-flow
//! matrix (labeled break/continue, return, exception propagation,
//! finally-override), a unified iteration protocol over sync and async
//! iterables, and coroutine semantics for interpreted generators, async
//! functions, and async generators.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod js_async;
pub(crate) mod js_async_generator;
pub(crate) mod js_coroutine;
pub(crate) mod js_generator;
pub(crate) mod js_json;
pub(crate) mod js_promise;
pub(crate) mod realm;

pub use core::{
    AssignOp, BinaryOp, CatchClause, Completion, Declarator, EvalCtx, Expr, ForTarget, FunctionKind, IterMode,
    LogicalOp, ObjectKind, ObjectMember, ObjectPatternProp, ObjectRef, Outcome, Pattern, Property, ScopeKind, ScopeRef, Statement,
    SwitchCase, UnaryOp, UpdateOp, Value, VarKind, call_value, enumerate_keys, error_object, evaluate_expr,
    evaluate_statement, evaluate_statements, get_iterator, get_property, lock, native_fn, new_array, new_child,
    new_plain_object, new_scope, program_from_json, scope_declare, set_own_property, set_property, strict_equals,
    to_boolean, value_to_string,
};
pub use error::JSError;
pub use js_json::{value_from_json, value_to_json};
pub use realm::{GeneratorValues, PromiseCapability, Realm};
