//! Statement and expression evaluation: the completion algebra, one
//! evaluator per statement kind, and the recursive expression entry
//! point every evaluator calls back into.

use std::sync::Arc;

use crate::core::expr::{AssignOp, BinaryOp, Expr, FunctionKind, LogicalOp, ObjectMember, UnaryOp, UpdateOp};
use crate::core::iterator::{IterMode, enumerate_keys, get_iterator};
use crate::core::scope::{ScopeKind, ScopeRef, function_scope, new_child, new_scope, scope_declare, scope_get_plain};
use crate::core::statement::{CatchClause, Declarator, ForTarget, Pattern, Statement, SwitchCase, VarKind};
use crate::core::value::{
    FunctionData, ObjectKind, ObjectRef, Property, Value, lock, loose_equals, native_fn, new_array, new_object,
    new_plain_object, strict_equals, to_boolean, to_number, type_of, value_to_string,
};
use crate::core::EvalCtx;
use crate::js_coroutine::ResumeSignal;
use crate::{JSError, raise_reference_error, raise_syntax_error, raise_type_error};

/// The completion record of a statement. Throw is not a variant: thrown
/// values and host errors travel as `Err(JSError)` so that `?` is the
/// propagation operator, while Break/Continue/Return stay ordinary data.
#[derive(Debug)]
pub enum Completion {
    Normal(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Return(Value),
}

pub type Outcome = Result<Completion, JSError>;

/// Evaluate a statement list: function declarations are hoisted first,
/// then children run in order until the first non-Normal completion,
/// which propagates unchanged. The Normal value is the last statement's
/// value (the embedding layer surfaces it as the program result).
pub fn evaluate_statements(ctx: &EvalCtx, scope: &ScopeRef, stmts: &[Statement]) -> Outcome {
    hoist_functions(scope, stmts);
    let mut last = Value::Undefined;
    for stmt in stmts {
        match evaluate_statement(ctx, scope, stmt)? {
            Completion::Normal(v) => last = v,
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(last))
}

/// Evaluate one statement. A return injected into a suspended coroutine
/// unwinds as the CoroutineReturn error signal (so `finally` blocks run);
/// it converts back into a Return completion here, at the first statement
/// boundary above the suspension point.
pub fn evaluate_statement(ctx: &EvalCtx, scope: &ScopeRef, stmt: &Statement) -> Outcome {
    match eval_statement_inner(ctx, scope, stmt) {
        Err(JSError::CoroutineReturn { value }) => Ok(Completion::Return(value)),
        other => other,
    }
}

fn eval_statement_inner(ctx: &EvalCtx, scope: &ScopeRef, stmt: &Statement) -> Outcome {
    match stmt {
        Statement::Expression { expression } => Ok(Completion::Normal(evaluate_expr(ctx, scope, expression)?)),
        Statement::VarDecl { kind, declarations } => eval_var_decl(ctx, scope, *kind, declarations),
        // bound during hoisting
        Statement::FunctionDecl { .. } => Ok(Completion::Normal(Value::Undefined)),
        Statement::Block { body } => {
            let block_scope = new_child(scope, ScopeKind::Block);
            evaluate_statements(ctx, &block_scope, body)
        }
        Statement::Empty | Statement::Debugger => Ok(Completion::Normal(Value::Undefined)),
        Statement::If { test, consequent, alternate } => {
            if to_boolean(&evaluate_expr(ctx, scope, test)?) {
                evaluate_statement(ctx, scope, consequent)
            } else if let Some(alt) = alternate {
                evaluate_statement(ctx, scope, alt)
            } else {
                Ok(Completion::Normal(Value::Undefined))
            }
        }
        Statement::While { test, body } => eval_while(ctx, scope, test, body, &[]),
        Statement::DoWhile { body, test } => eval_do_while(ctx, scope, body, test, &[]),
        Statement::For { init, test, update, body } => {
            eval_for(ctx, scope, init.as_deref(), test.as_ref(), update.as_ref(), body, &[])
        }
        Statement::ForIn { left, right, body } => eval_for_in(ctx, scope, left, right, body, &[]),
        Statement::ForOf { left, right, awaited, body } => {
            eval_for_of(ctx, scope, left, right, *awaited, body, &[])
        }
        Statement::Switch { discriminant, cases } => eval_switch(ctx, scope, discriminant, cases),
        Statement::Labeled { label, body } => {
            let mut labels = vec![label.clone()];
            let mut inner: &Statement = body;
            while let Statement::Labeled { label, body } = inner {
                labels.push(label.clone());
                inner = body;
            }
            eval_labeled(ctx, scope, inner, &labels)
        }
        Statement::Break { label } => Ok(Completion::Break(label.clone())),
        Statement::Continue { label } => Ok(Completion::Continue(label.clone())),
        Statement::Return { argument } => {
            let value = match argument {
                Some(expr) => evaluate_expr(ctx, scope, expr)?,
                None => Value::Undefined,
            };
            Ok(Completion::Return(value))
        }
        Statement::Throw { argument } => {
            let value = evaluate_expr(ctx, scope, argument)?;
            Err(JSError::Throw { value })
        }
        Statement::Try { block, handler, finalizer } => eval_try(ctx, scope, block, handler.as_ref(), finalizer.as_deref()),
        Statement::With { object, body } => {
            let target = evaluate_expr(ctx, scope, object)?;
            let Value::Object(obj) = target else {
                return Err(raise_type_error!("with target must be an object"));
            };
            let overlay = new_child(scope, ScopeKind::With(obj));
            evaluate_statement(ctx, &overlay, body)
        }
    }
}

/// A labeled statement. Loops receive the whole label set so they can
/// absorb their own labeled break/continue; the other labelable kinds
/// absorb a matching break only. Everything else cannot carry a label,
/// and fails before the inner node runs.
fn eval_labeled(ctx: &EvalCtx, scope: &ScopeRef, stmt: &Statement, labels: &[String]) -> Outcome {
    match stmt {
        Statement::While { test, body } => eval_while(ctx, scope, test, body, labels),
        Statement::DoWhile { body, test } => eval_do_while(ctx, scope, body, test, labels),
        Statement::For { init, test, update, body } => {
            eval_for(ctx, scope, init.as_deref(), test.as_ref(), update.as_ref(), body, labels)
        }
        Statement::ForIn { left, right, body } => eval_for_in(ctx, scope, left, right, body, labels),
        Statement::ForOf { left, right, awaited, body } => {
            eval_for_of(ctx, scope, left, right, *awaited, body, labels)
        }
        Statement::Block { .. }
        | Statement::If { .. }
        | Statement::With { .. }
        | Statement::Try { .. }
        | Statement::Switch { .. } => match evaluate_statement(ctx, scope, stmt)? {
            Completion::Break(Some(l)) if labels.contains(&l) => Ok(Completion::Normal(Value::Undefined)),
            other => Ok(other),
        },
        _ => Err(raise_syntax_error!("this statement kind cannot be labeled")),
    }
}

enum LoopStep {
    Next,
    Exit,
    Out(Completion),
}

/// The loop half of the completion algebra: what one body completion
/// means for the enclosing loop carrying `labels`.
fn after_body(completion: Completion, labels: &[String]) -> LoopStep {
    match completion {
        Completion::Normal(_) | Completion::Continue(None) => LoopStep::Next,
        Completion::Continue(Some(l)) if labels.iter().any(|x| *x == l) => LoopStep::Next,
        c @ Completion::Continue(_) => LoopStep::Out(c),
        Completion::Break(None) => LoopStep::Exit,
        Completion::Break(Some(l)) if labels.iter().any(|x| *x == l) => LoopStep::Exit,
        c @ Completion::Break(_) => LoopStep::Out(c),
        c @ Completion::Return(_) => LoopStep::Out(c),
    }
}

fn eval_while(ctx: &EvalCtx, scope: &ScopeRef, test: &Expr, body: &Statement, labels: &[String]) -> Outcome {
    loop {
        if !to_boolean(&evaluate_expr(ctx, scope, test)?) {
            break;
        }
        match after_body(evaluate_statement(ctx, scope, body)?, labels) {
            LoopStep::Next => {}
            LoopStep::Exit => break,
            LoopStep::Out(c) => return Ok(c),
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

fn eval_do_while(ctx: &EvalCtx, scope: &ScopeRef, body: &Statement, test: &Expr, labels: &[String]) -> Outcome {
    loop {
        match after_body(evaluate_statement(ctx, scope, body)?, labels) {
            LoopStep::Next => {}
            LoopStep::Exit => break,
            LoopStep::Out(c) => return Ok(c),
        }
        if !to_boolean(&evaluate_expr(ctx, scope, test)?) {
            break;
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

fn eval_for(
    ctx: &EvalCtx,
    scope: &ScopeRef,
    init: Option<&Statement>,
    test: Option<&Expr>,
    update: Option<&Expr>,
    body: &Statement,
    labels: &[String],
) -> Outcome {
    let loop_scope = new_child(scope, ScopeKind::Block);
    let mut per_iteration: Vec<String> = Vec::new();
    if let Some(init) = init {
        match evaluate_statement(ctx, &loop_scope, init)? {
            Completion::Normal(_) => {}
            other => return Ok(other),
        }
        if let Statement::VarDecl { kind: VarKind::Let | VarKind::Const, declarations } = init {
            for d in declarations {
                collect_pattern_names(&d.id, &mut per_iteration);
            }
        }
    }

    // A lexically bound loop variable gets a fresh frame each iteration,
    // carrying the previous iteration's values forward, so closures made
    // in the body capture distinct bindings.
    let mut iter_scope = if per_iteration.is_empty() {
        loop_scope.clone()
    } else {
        copy_loop_frame(scope, &loop_scope, &per_iteration)
    };

    loop {
        if let Some(test) = test {
            if !to_boolean(&evaluate_expr(ctx, &iter_scope, test)?) {
                break;
            }
        }
        match after_body(evaluate_statement(ctx, &iter_scope, body)?, labels) {
            LoopStep::Next => {}
            LoopStep::Exit => break,
            LoopStep::Out(c) => return Ok(c),
        }
        if !per_iteration.is_empty() {
            iter_scope = copy_loop_frame(scope, &iter_scope, &per_iteration);
        }
        if let Some(update) = update {
            evaluate_expr(ctx, &iter_scope, update)?;
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

fn copy_loop_frame(parent: &ScopeRef, from: &ScopeRef, names: &[String]) -> ScopeRef {
    let fresh = new_child(parent, ScopeKind::Block);
    for name in names {
        let copied = {
            let data = lock(from);
            data.bindings.get(name).map(|b| (b.value.clone(), b.mutable))
        };
        if let Some((value, mutable)) = copied {
            scope_declare(&fresh, name, value, mutable);
        }
    }
    fresh
}

fn eval_for_in(
    ctx: &EvalCtx,
    scope: &ScopeRef,
    left: &ForTarget,
    right: &Expr,
    body: &Statement,
    labels: &[String],
) -> Outcome {
    let target = evaluate_expr(ctx, scope, right)?;
    if matches!(target, Value::Undefined | Value::Null) {
        return Ok(Completion::Normal(Value::Undefined));
    }
    for key in enumerate_keys(&target) {
        let iter_scope = new_child(scope, ScopeKind::Block);
        bind_for_target(ctx, &iter_scope, scope, left, key.into())?;
        match after_body(evaluate_statement(ctx, &iter_scope, body)?, labels) {
            LoopStep::Next => {}
            LoopStep::Exit => break,
            LoopStep::Out(c) => return Ok(c),
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

fn eval_for_of(
    ctx: &EvalCtx,
    scope: &ScopeRef,
    left: &ForTarget,
    right: &Expr,
    awaited: bool,
    body: &Statement,
    labels: &[String],
) -> Outcome {
    if awaited && !ctx.kind.is_async() {
        return Err(raise_syntax_error!("for await outside of an async body"));
    }
    let iterable = evaluate_expr(ctx, scope, right)?;
    let mode = if awaited { IterMode::Async } else { IterMode::Sync };
    let mut iter = get_iterator(ctx, &iterable, mode)?;

    loop {
        let Some(value) = iter.step(ctx)? else { break };
        let iter_scope = new_child(scope, ScopeKind::Block);
        if let Err(e) = bind_for_target(ctx, &iter_scope, scope, left, value) {
            iter.close_on_error(ctx, &e);
            return Err(e);
        }
        let completion = match evaluate_statement(ctx, &iter_scope, body) {
            Ok(c) => c,
            Err(e) => {
                // thrown exception wins over any close-time error
                iter.close_on_error(ctx, &e);
                return Err(e);
            }
        };
        match after_body(completion, labels) {
            LoopStep::Next => {}
            LoopStep::Exit => {
                iter.close(ctx)?;
                break;
            }
            LoopStep::Out(c) => {
                iter.close(ctx)?;
                return Ok(c);
            }
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

fn bind_for_target(
    ctx: &EvalCtx,
    iter_scope: &ScopeRef,
    outer: &ScopeRef,
    target: &ForTarget,
    value: Value,
) -> Result<(), JSError> {
    match target.kind {
        Some(kind) => bind_pattern(ctx, iter_scope, &target.pattern, value, kind != VarKind::Const),
        None => match &target.pattern {
            Pattern::Identifier { name } => assign_binding(ctx, outer, name, value),
            _ => Err(raise_syntax_error!("loop target without declaration must be an identifier")),
        },
    }
}

fn eval_switch(ctx: &EvalCtx, scope: &ScopeRef, discriminant: &Expr, cases: &[SwitchCase]) -> Outcome {
    let disc = evaluate_expr(ctx, scope, discriminant)?;
    let switch_scope = new_child(scope, ScopeKind::Block);

    let mut selected = None;
    for (i, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let test_value = evaluate_expr(ctx, &switch_scope, test)?;
            if strict_equals(&disc, &test_value) {
                selected = Some(i);
                break;
            }
        }
    }
    // the default clause is chosen only after every test failed, wherever
    // it sits among the cases; fall-through then continues from there
    if selected.is_none() {
        selected = cases.iter().position(|c| c.test.is_none());
    }

    let mut last = Value::Undefined;
    if let Some(start) = selected {
        for case in &cases[start..] {
            for stmt in &case.consequent {
                match evaluate_statement(ctx, &switch_scope, stmt)? {
                    Completion::Normal(v) => last = v,
                    Completion::Break(None) => return Ok(Completion::Normal(Value::Undefined)),
                    // a bare continue is not for the switch: let the loop have it
                    other => return Ok(other),
                }
            }
        }
    }
    Ok(Completion::Normal(last))
}

fn eval_try(
    ctx: &EvalCtx,
    scope: &ScopeRef,
    block: &[Statement],
    handler: Option<&CatchClause>,
    finalizer: Option<&[Statement]>,
) -> Outcome {
    let mut result = {
        let try_scope = new_child(scope, ScopeKind::Block);
        evaluate_statements(ctx, &try_scope, block)
    };

    if let Err(e) = &result
        && e.is_catchable()
        && let Some(handler) = handler
    {
        let thrown = e.thrown_value();
        result = run_catch(ctx, scope, handler, thrown);
    }

    // a detached coroutine unwinds without interpreted cleanup
    if matches!(result, Err(JSError::Detached)) {
        return result;
    }
    if let Some(finalizer) = finalizer {
        let finally_scope = new_child(scope, ScopeKind::Block);
        match evaluate_statements(ctx, &finally_scope, finalizer) {
            // a quiet finally leaves the try/catch result standing
            Ok(Completion::Normal(_)) => {}
            // an abrupt finally wins over whatever was pending
            other => result = other,
        }
    }
    result
}

fn run_catch(ctx: &EvalCtx, scope: &ScopeRef, handler: &CatchClause, thrown: Value) -> Outcome {
    let catch_scope = new_child(scope, ScopeKind::Block);
    if let Some(param) = &handler.param {
        bind_pattern(ctx, &catch_scope, param, thrown, true)?;
    }
    evaluate_statements(ctx, &catch_scope, &handler.body)
}

fn eval_var_decl(ctx: &EvalCtx, scope: &ScopeRef, kind: VarKind, declarations: &[Declarator]) -> Outcome {
    for d in declarations {
        let value = match &d.init {
            Some(expr) => evaluate_expr(ctx, scope, expr)?,
            None => {
                if kind == VarKind::Const {
                    return Err(raise_syntax_error!("const declaration must have an initializer"));
                }
                Value::Undefined
            }
        };
        match kind {
            VarKind::Var => {
                let target = function_scope(scope);
                bind_pattern(ctx, &target, &d.id, value, true)?;
            }
            VarKind::Let => bind_pattern(ctx, scope, &d.id, value, true)?,
            VarKind::Const => bind_pattern(ctx, scope, &d.id, value, false)?,
        }
    }
    Ok(Completion::Normal(Value::Undefined))
}

/// Destructure `value` into `pattern`, declaring the resulting bindings
/// in `scope`.
pub fn bind_pattern(ctx: &EvalCtx, scope: &ScopeRef, pattern: &Pattern, value: Value, mutable: bool) -> Result<(), JSError> {
    match pattern {
        Pattern::Identifier { name } => {
            scope_declare(scope, name, value, mutable);
            Ok(())
        }
        Pattern::Object { properties } => {
            if matches!(value, Value::Undefined | Value::Null) {
                return Err(raise_type_error!("cannot destructure undefined or null"));
            }
            for prop in properties {
                let member = get_property(ctx, &value, &prop.key)?;
                match &prop.value {
                    Some(sub) => bind_pattern(ctx, scope, sub, member, mutable)?,
                    None => scope_declare(scope, &prop.key, member, mutable),
                }
            }
            Ok(())
        }
        Pattern::Array { elements } => {
            let mut iter = get_iterator(ctx, &value, IterMode::Sync)?;
            for slot in elements {
                let element = iter.step(ctx)?.unwrap_or(Value::Undefined);
                if let Some(sub) = slot {
                    bind_pattern(ctx, scope, sub, element, mutable)?;
                }
            }
            iter.close(ctx)?;
            Ok(())
        }
    }
}

fn collect_pattern_names(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Identifier { name } => out.push(name.clone()),
        Pattern::Object { properties } => {
            for prop in properties {
                match &prop.value {
                    Some(sub) => collect_pattern_names(sub, out),
                    None => out.push(prop.key.clone()),
                }
            }
        }
        Pattern::Array { elements } => {
            for slot in elements.iter().flatten() {
                collect_pattern_names(slot, out);
            }
        }
    }
}

fn hoist_functions(scope: &ScopeRef, stmts: &[Statement]) {
    for stmt in stmts {
        if let Statement::FunctionDecl { name, kind, params, body } = stmt {
            let f = make_function(scope, Some(name.clone()), *kind, params.clone(), body);
            scope_declare(scope, name, f, true);
        }
    }
}

/// Pre-declare every `var` name in a function body as undefined, walking
/// into nested blocks and control structures but not nested functions.
pub fn hoist_var_names(scope: &ScopeRef, stmts: &[Statement]) {
    let mut names = Vec::new();
    for stmt in stmts {
        collect_var_names(stmt, &mut names);
    }
    for name in names {
        let already = lock(scope).bindings.contains_key(&name);
        if !already {
            scope_declare(scope, &name, Value::Undefined, true);
        }
    }
}

fn collect_var_names(stmt: &Statement, out: &mut Vec<String>) {
    match stmt {
        Statement::VarDecl { kind: VarKind::Var, declarations } => {
            for d in declarations {
                collect_pattern_names(&d.id, out);
            }
        }
        Statement::Block { body } => {
            for s in body {
                collect_var_names(s, out);
            }
        }
        Statement::If { consequent, alternate, .. } => {
            collect_var_names(consequent, out);
            if let Some(alt) = alternate {
                collect_var_names(alt, out);
            }
        }
        Statement::While { body, .. } | Statement::DoWhile { body, .. } | Statement::Labeled { body, .. } => {
            collect_var_names(body, out);
        }
        Statement::For { init, body, .. } => {
            if let Some(init) = init {
                collect_var_names(init, out);
            }
            collect_var_names(body, out);
        }
        Statement::ForIn { left, body, .. } | Statement::ForOf { left, body, .. } => {
            if left.kind == Some(VarKind::Var) {
                collect_pattern_names(&left.pattern, out);
            }
            collect_var_names(body, out);
        }
        Statement::Try { block, handler, finalizer } => {
            for s in block {
                collect_var_names(s, out);
            }
            if let Some(h) = handler {
                for s in &h.body {
                    collect_var_names(s, out);
                }
            }
            if let Some(f) = finalizer {
                for s in f {
                    collect_var_names(s, out);
                }
            }
        }
        Statement::Switch { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_var_names(s, out);
                }
            }
        }
        Statement::With { body, .. } => collect_var_names(body, out),
        _ => {}
    }
}

// ── name resolution ────────────────────────────────────────────────────

/// Resolve a name through the scope chain. A `with` overlay answers when
/// its object currently has the property, querying it live so accessor
/// aliasing is preserved.
pub fn resolve_binding(ctx: &EvalCtx, scope: &ScopeRef, name: &str) -> Result<Value, JSError> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        let (overlay, found, parent) = {
            let data = lock(&s);
            let overlay = match &data.kind {
                ScopeKind::With(obj) => Some(obj.clone()),
                _ => None,
            };
            let found = data.bindings.get(name).map(|b| b.value.clone());
            (overlay, found, data.parent.clone())
        };
        if let Some(obj) = overlay
            && object_has_property(&obj, name)
        {
            return get_property(ctx, &Value::Object(obj), name);
        }
        if let Some(value) = found {
            return Ok(value);
        }
        current = parent;
    }
    Err(raise_reference_error!(format!("{name} is not defined")))
}

/// Assign to a name through the scope chain; a `with` overlay claims the
/// assignment when its object currently has the property.
pub fn assign_binding(ctx: &EvalCtx, scope: &ScopeRef, name: &str, value: Value) -> Result<(), JSError> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        let (overlay, parent) = {
            let data = lock(&s);
            let overlay = match &data.kind {
                ScopeKind::With(obj) => Some(obj.clone()),
                _ => None,
            };
            (overlay, data.parent.clone())
        };
        if let Some(obj) = overlay
            && object_has_property(&obj, name)
        {
            return set_property(ctx, &Value::Object(obj), name, value);
        }
        {
            let mut data = lock(&s);
            if let Some(binding) = data.bindings.get_mut(name) {
                if !binding.mutable {
                    return Err(raise_type_error!(format!("assignment to constant variable {name}")));
                }
                binding.value = value;
                return Ok(());
            }
        }
        current = parent;
    }
    Err(raise_reference_error!(format!("{name} is not defined")))
}

// ── property access ────────────────────────────────────────────────────

/// Does the object (or its prototype chain) have `key`, counting array
/// elements and kind-specific members.
pub fn object_has_property(obj: &ObjectRef, key: &str) -> bool {
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let data = lock(&o);
        if let ObjectKind::Array(elements) = &data.kind {
            if key == "length" {
                return true;
            }
            if let Some(i) = crate::core::value::array_index(key)
                && i < elements.len()
            {
                return true;
            }
        }
        if data.properties.contains_key(key) {
            return true;
        }
        current = data.prototype.clone();
    }
    false
}

/// Property read with accessor dispatch and the kind-specific members
/// (array length/elements, generator methods, string length).
pub fn get_property(ctx: &EvalCtx, target: &Value, key: &str) -> Result<Value, JSError> {
    match target {
        Value::Undefined | Value::Null => Err(raise_type_error!(format!(
            "cannot read property '{key}' of {}",
            value_to_string(target)
        ))),
        Value::String(s) => Ok(match key {
            "length" => Value::Number(s.chars().count() as f64),
            _ => match crate::core::value::array_index(key) {
                Some(i) => s.chars().nth(i).map(|c| Value::from(c.to_string())).unwrap_or(Value::Undefined),
                None => Value::Undefined,
            },
        }),
        Value::Boolean(_) | Value::Number(_) => Ok(Value::Undefined),
        Value::Object(obj) => {
            enum Special {
                Array,
                Generator,
                AsyncGenerator,
                Other,
            }
            let special = match &lock(obj).kind {
                ObjectKind::Array(_) => Special::Array,
                ObjectKind::Generator(_) => Special::Generator,
                ObjectKind::AsyncGenerator(_) => Special::AsyncGenerator,
                _ => Special::Other,
            };
            match special {
                Special::Array => {
                    {
                        let data = lock(obj);
                        if let ObjectKind::Array(elements) = &data.kind {
                            if key == "length" {
                                return Ok(Value::Number(elements.len() as f64));
                            }
                            if let Some(i) = crate::core::value::array_index(key) {
                                return Ok(elements.get(i).cloned().unwrap_or(Value::Undefined));
                            }
                        }
                    }
                    if let Some(m) = array_method(obj, key) {
                        return Ok(m);
                    }
                }
                Special::Generator => {
                    if let Some(m) = crate::js_generator::generator_method(obj, key) {
                        return Ok(m);
                    }
                }
                Special::AsyncGenerator => {
                    if let Some(m) = crate::js_async_generator::async_generator_method(obj, key) {
                        return Ok(m);
                    }
                }
                Special::Other => {}
            }

            let found = {
                let mut current = Some(obj.clone());
                let mut found = None;
                while let Some(o) = current {
                    let data = lock(&o);
                    if let Some(prop) = data.properties.get(key) {
                        found = Some(prop.clone());
                        break;
                    }
                    current = data.prototype.clone();
                }
                found
            };
            match found {
                Some(Property::Data { value, .. }) => Ok(value),
                Some(Property::Accessor { get: Some(getter), .. }) => call_value(ctx, &getter, target.clone(), vec![]),
                Some(Property::Accessor { get: None, .. }) => Ok(Value::Undefined),
                None => Ok(Value::Undefined),
            }
        }
    }
}

/// Property write with accessor dispatch (setters are found through the
/// prototype chain; a getter-only property rejects the write).
pub fn set_property(ctx: &EvalCtx, target: &Value, key: &str, value: Value) -> Result<(), JSError> {
    let Value::Object(obj) = target else {
        return Err(raise_type_error!(format!(
            "cannot set property '{key}' of {}",
            value_to_string(target)
        )));
    };

    {
        let mut data = lock(obj);
        if let ObjectKind::Array(elements) = &mut data.kind {
            if let Some(i) = crate::core::value::array_index(key) {
                if i >= elements.len() {
                    elements.resize(i + 1, Value::Undefined);
                }
                elements[i] = value;
                return Ok(());
            }
            if key == "length" {
                let len = to_number(&value).max(0.0) as usize;
                elements.resize(len, Value::Undefined);
                return Ok(());
            }
        }
    }

    // find an accessor anywhere on the chain before creating an own slot
    let accessor = {
        let mut current = Some(obj.clone());
        let mut accessor = None;
        while let Some(o) = current {
            let data = lock(&o);
            if let Some(prop) = data.properties.get(key) {
                if let Property::Accessor { set, .. } = prop {
                    accessor = Some(set.clone());
                }
                break;
            }
            current = data.prototype.clone();
        }
        accessor
    };
    match accessor {
        Some(Some(setter)) => {
            call_value(ctx, &setter, target.clone(), vec![value])?;
            Ok(())
        }
        Some(None) => Err(raise_type_error!(format!(
            "cannot set property '{key}' which has only a getter"
        ))),
        None => {
            let mut data = lock(obj);
            match data.properties.get_mut(key) {
                Some(Property::Data { value: slot, .. }) => *slot = value,
                _ => {
                    data.properties.insert(key.to_string(), Property::data(value));
                }
            }
            Ok(())
        }
    }
}

fn array_method(obj: &ObjectRef, key: &str) -> Option<Value> {
    match key {
        "push" => {
            let target = obj.clone();
            Some(native_fn("push", move |_ctx, _this, args| {
                let mut data = lock(&target);
                match &mut data.kind {
                    ObjectKind::Array(elements) => {
                        elements.extend(args.iter().cloned());
                        Ok(Value::Number(elements.len() as f64))
                    }
                    _ => Err(raise_type_error!("push called on a non-array")),
                }
            }))
        }
        "pop" => {
            let target = obj.clone();
            Some(native_fn("pop", move |_ctx, _this, _args| {
                let mut data = lock(&target);
                match &mut data.kind {
                    ObjectKind::Array(elements) => Ok(elements.pop().unwrap_or(Value::Undefined)),
                    _ => Err(raise_type_error!("pop called on a non-array")),
                }
            }))
        }
        _ => None,
    }
}

// ── calls and function bodies ──────────────────────────────────────────

enum Callee {
    Interpreted(Arc<FunctionData>),
    Native(crate::core::value::NativeFn),
}

/// Call a value: natives run directly; interpreted functions dispatch on
/// their kind — plain calls evaluate in place, generator kinds build
/// their coroutine-backed objects, async calls return a promise.
pub fn call_value(ctx: &EvalCtx, func: &Value, this: Value, args: Vec<Value>) -> Result<Value, JSError> {
    let callee = match func {
        Value::Object(obj) => {
            let data = lock(obj);
            match &data.kind {
                ObjectKind::Function(fd) => Callee::Interpreted(fd.clone()),
                ObjectKind::Native { func, .. } => Callee::Native(func.clone()),
                _ => return Err(raise_type_error!(format!("{} is not a function", value_to_string(func)))),
            }
        }
        _ => return Err(raise_type_error!(format!("{} is not a function", value_to_string(func)))),
    };
    match callee {
        Callee::Native(f) => f(ctx, this, &args),
        Callee::Interpreted(fd) => match fd.kind {
            FunctionKind::Normal => {
                let call_ctx = ctx.for_plain_call();
                run_function_body(&call_ctx, &fd, this, args)
            }
            FunctionKind::Generator => Ok(crate::js_generator::create_generator(ctx, fd, this, args)),
            FunctionKind::Async => crate::js_async::call_async_function(ctx, fd, this, args),
            FunctionKind::AsyncGenerator => Ok(crate::js_async_generator::create_async_generator(ctx, fd, this, args)),
        },
    }
}

/// Bind parameters and `this`, hoist `var` names, evaluate the body, and
/// map its completion to the call result. A Break/Continue surviving to
/// this boundary is the "illegal break/continue" runtime error.
pub fn run_function_body(ctx: &EvalCtx, function: &FunctionData, this: Value, args: Vec<Value>) -> Result<Value, JSError> {
    let scope = new_scope(ScopeKind::Function, Some(function.closure.clone()));
    scope_declare(&scope, "this", this, false);
    for (i, param) in function.params.iter().enumerate() {
        let value = args.get(i).cloned().unwrap_or(Value::Undefined);
        bind_pattern(ctx, &scope, param, value, true)?;
    }
    hoist_var_names(&scope, &function.body);
    match evaluate_statements(ctx, &scope, &function.body)? {
        Completion::Return(v) => Ok(v),
        Completion::Normal(_) => Ok(Value::Undefined),
        Completion::Break(_) => Err(JSError::RuntimeError {
            message: "illegal break statement".to_string(),
        }),
        Completion::Continue(_) => Err(JSError::RuntimeError {
            message: "illegal continue statement".to_string(),
        }),
    }
}

pub fn make_function(
    scope: &ScopeRef,
    name: Option<String>,
    kind: FunctionKind,
    params: Vec<Pattern>,
    body: &[Statement],
) -> Value {
    Value::Object(new_object(ObjectKind::Function(Arc::new(FunctionData {
        name,
        kind,
        params,
        body: Arc::new(body.to_vec()),
        closure: scope.clone(),
    }))))
}

// ── expressions ────────────────────────────────────────────────────────

pub fn evaluate_expr(ctx: &EvalCtx, scope: &ScopeRef, expr: &Expr) -> Result<Value, JSError> {
    match expr {
        Expr::Number { value } => Ok(Value::Number(*value)),
        Expr::Str { value } => Ok(Value::from(value.as_str())),
        Expr::Bool { value } => Ok(Value::Boolean(*value)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Ident { name } => resolve_binding(ctx, scope, name),
        Expr::This => Ok(scope_get_plain(scope, "this").unwrap_or(Value::Undefined)),
        Expr::Array { elements } => {
            let mut values = Vec::with_capacity(elements.len());
            for e in elements {
                values.push(evaluate_expr(ctx, scope, e)?);
            }
            Ok(Value::Object(new_array(values)))
        }
        Expr::Object { properties } => eval_object_literal(ctx, scope, properties),
        Expr::Member { object, property } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            get_property(ctx, &obj, property)
        }
        Expr::Index { object, index } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            let key = value_to_string(&evaluate_expr(ctx, scope, index)?);
            get_property(ctx, &obj, &key)
        }
        Expr::Call { callee, arguments } => {
            let (func, this) = match &**callee {
                Expr::Member { object, property } => {
                    let obj = evaluate_expr(ctx, scope, object)?;
                    (get_property(ctx, &obj, property)?, obj)
                }
                Expr::Index { object, index } => {
                    let obj = evaluate_expr(ctx, scope, object)?;
                    let key = value_to_string(&evaluate_expr(ctx, scope, index)?);
                    (get_property(ctx, &obj, &key)?, obj)
                }
                other => (evaluate_expr(ctx, scope, other)?, Value::Undefined),
            };
            let mut args = Vec::with_capacity(arguments.len());
            for a in arguments {
                args.push(evaluate_expr(ctx, scope, a)?);
            }
            call_value(ctx, &func, this, args)
        }
        Expr::Assign { operator, target, value } => {
            let rhs = evaluate_expr(ctx, scope, value)?;
            eval_assign(ctx, scope, *operator, target, rhs)
        }
        Expr::Update { operator, prefix, argument } => eval_update(ctx, scope, *operator, *prefix, argument),
        Expr::Unary { operator, argument } => match operator {
            UnaryOp::Not => Ok(Value::Boolean(!to_boolean(&evaluate_expr(ctx, scope, argument)?))),
            UnaryOp::Neg => Ok(Value::Number(-to_number(&evaluate_expr(ctx, scope, argument)?))),
            UnaryOp::TypeOf => {
                // typeof tolerates unresolved names
                if let Expr::Ident { name } = &**argument {
                    match resolve_binding(ctx, scope, name) {
                        Ok(v) => Ok(Value::from(type_of(&v))),
                        Err(JSError::ReferenceError { .. }) => Ok(Value::from("undefined")),
                        Err(e) => Err(e),
                    }
                } else {
                    Ok(Value::from(type_of(&evaluate_expr(ctx, scope, argument)?)))
                }
            }
        },
        Expr::Binary { operator, left, right } => {
            let l = evaluate_expr(ctx, scope, left)?;
            let r = evaluate_expr(ctx, scope, right)?;
            eval_binary(*operator, &l, &r)
        }
        Expr::Logical { operator, left, right } => {
            let l = evaluate_expr(ctx, scope, left)?;
            let take_right = match operator {
                LogicalOp::And => to_boolean(&l),
                LogicalOp::Or => !to_boolean(&l),
                LogicalOp::Nullish => matches!(l, Value::Undefined | Value::Null),
            };
            if take_right {
                evaluate_expr(ctx, scope, right)
            } else {
                Ok(l)
            }
        }
        Expr::Conditional { test, consequent, alternate } => {
            if to_boolean(&evaluate_expr(ctx, scope, test)?) {
                evaluate_expr(ctx, scope, consequent)
            } else {
                evaluate_expr(ctx, scope, alternate)
            }
        }
        Expr::Function { name, kind, params, body } => {
            Ok(make_function(scope, name.clone(), *kind, params.clone(), body))
        }
        Expr::Await { argument } => {
            let value = evaluate_expr(ctx, scope, argument)?;
            ctx.await_value(value)
        }
        Expr::Yield { argument, delegate } => {
            if !ctx.kind.is_generator() {
                return Err(raise_syntax_error!("yield outside of a generator body"));
            }
            if *delegate {
                let arg = argument
                    .as_ref()
                    .ok_or_else(|| raise_syntax_error!("yield* requires an operand"))?;
                let iterable = evaluate_expr(ctx, scope, arg)?;
                eval_yield_delegate(ctx, iterable)
            } else {
                let mut value = match argument {
                    Some(a) => evaluate_expr(ctx, scope, a)?,
                    None => Value::Undefined,
                };
                // async generators settle the yielded value first
                if ctx.kind == FunctionKind::AsyncGenerator {
                    value = ctx.await_value(value)?;
                }
                ctx.suspend_yield(value)
            }
        }
    }
}

/// `yield*`: every pull, throw, and return sent to the delegating
/// generator is forwarded into the delegated iterator first; only its
/// completion ends the delegation.
fn eval_yield_delegate(ctx: &EvalCtx, iterable: Value) -> Result<Value, JSError> {
    let mode = if ctx.kind == FunctionKind::AsyncGenerator {
        IterMode::Async
    } else {
        IterMode::Sync
    };
    let mut iter = get_iterator(ctx, &iterable, mode)?;
    let mut signal = ResumeSignal::Next(Value::Undefined);
    loop {
        let was_return = matches!(signal, ResumeSignal::Return(_));
        let step = iter.advance(ctx, signal)?;
        if step.done {
            if was_return {
                return Err(JSError::CoroutineReturn { value: step.value });
            }
            return Ok(step.value);
        }
        signal = ctx.suspend_yield_raw(step.value)?;
    }
}

fn eval_object_literal(ctx: &EvalCtx, scope: &ScopeRef, properties: &[ObjectMember]) -> Result<Value, JSError> {
    let obj = new_plain_object();
    for member in properties {
        match member {
            ObjectMember::Init { key, value } => {
                let v = evaluate_expr(ctx, scope, value)?;
                lock(&obj).properties.insert(key.clone(), Property::data(v));
            }
            ObjectMember::Get { key, body } => {
                let getter = make_function(scope, None, FunctionKind::Normal, vec![], body);
                merge_accessor(&obj, key, Some(getter), None);
            }
            ObjectMember::Set { key, param, body } => {
                let setter = make_function(scope, None, FunctionKind::Normal, vec![param.clone()], body);
                merge_accessor(&obj, key, None, Some(setter));
            }
        }
    }
    Ok(Value::Object(obj))
}

fn merge_accessor(obj: &ObjectRef, key: &str, get: Option<Value>, set: Option<Value>) {
    let mut data = lock(obj);
    let merged = match data.properties.get(key) {
        Some(Property::Accessor { get: g, set: s, enumerable }) => Property::Accessor {
            get: get.or_else(|| g.clone()),
            set: set.or_else(|| s.clone()),
            enumerable: *enumerable,
        },
        _ => Property::Accessor { get, set, enumerable: true },
    };
    data.properties.insert(key.to_string(), merged);
}

fn eval_assign(ctx: &EvalCtx, scope: &ScopeRef, op: AssignOp, target: &Expr, rhs: Value) -> Result<Value, JSError> {
    match target {
        Expr::Ident { name } => {
            let new = match op {
                AssignOp::Assign => rhs,
                _ => combine_assign(op, &resolve_binding(ctx, scope, name)?, &rhs)?,
            };
            assign_binding(ctx, scope, name, new.clone())?;
            Ok(new)
        }
        Expr::Member { object, property } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            let new = match op {
                AssignOp::Assign => rhs,
                _ => combine_assign(op, &get_property(ctx, &obj, property)?, &rhs)?,
            };
            set_property(ctx, &obj, property, new.clone())?;
            Ok(new)
        }
        Expr::Index { object, index } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            let key = value_to_string(&evaluate_expr(ctx, scope, index)?);
            let new = match op {
                AssignOp::Assign => rhs,
                _ => combine_assign(op, &get_property(ctx, &obj, &key)?, &rhs)?,
            };
            set_property(ctx, &obj, &key, new.clone())?;
            Ok(new)
        }
        _ => Err(raise_syntax_error!("invalid assignment target")),
    }
}

fn combine_assign(op: AssignOp, old: &Value, rhs: &Value) -> Result<Value, JSError> {
    match op {
        AssignOp::Assign => Ok(rhs.clone()),
        AssignOp::Add => eval_binary(BinaryOp::Add, old, rhs),
        AssignOp::Sub => eval_binary(BinaryOp::Sub, old, rhs),
    }
}

fn eval_update(ctx: &EvalCtx, scope: &ScopeRef, op: UpdateOp, prefix: bool, argument: &Expr) -> Result<Value, JSError> {
    let delta = match op {
        UpdateOp::Inc => 1.0,
        UpdateOp::Dec => -1.0,
    };
    let (old, new) = match argument {
        Expr::Ident { name } => {
            let old = to_number(&resolve_binding(ctx, scope, name)?);
            let new = old + delta;
            assign_binding(ctx, scope, name, Value::Number(new))?;
            (old, new)
        }
        Expr::Member { object, property } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            let old = to_number(&get_property(ctx, &obj, property)?);
            let new = old + delta;
            set_property(ctx, &obj, property, Value::Number(new))?;
            (old, new)
        }
        Expr::Index { object, index } => {
            let obj = evaluate_expr(ctx, scope, object)?;
            let key = value_to_string(&evaluate_expr(ctx, scope, index)?);
            let old = to_number(&get_property(ctx, &obj, &key)?);
            let new = old + delta;
            set_property(ctx, &obj, &key, Value::Number(new))?;
            (old, new)
        }
        _ => return Err(raise_syntax_error!("invalid update target")),
    };
    Ok(Value::Number(if prefix { new } else { old }))
}

fn eval_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, JSError> {
    let value = match op {
        BinaryOp::Add => match (l, r) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::from(format!("{}{}", value_to_string(l), value_to_string(r)))
            }
            _ => Value::Number(to_number(l) + to_number(r)),
        },
        BinaryOp::Sub => Value::Number(to_number(l) - to_number(r)),
        BinaryOp::Mul => Value::Number(to_number(l) * to_number(r)),
        BinaryOp::Div => Value::Number(to_number(l) / to_number(r)),
        BinaryOp::Rem => Value::Number(to_number(l) % to_number(r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let result = match (l, r) {
                (Value::String(a), Value::String(b)) => match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Le => a <= b,
                    BinaryOp::Gt => a > b,
                    _ => a >= b,
                },
                _ => {
                    let (a, b) = (to_number(l), to_number(r));
                    match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Le => a <= b,
                        BinaryOp::Gt => a > b,
                        _ => a >= b,
                    }
                }
            };
            Value::Boolean(result)
        }
        BinaryOp::Eq => Value::Boolean(loose_equals(l, r)),
        BinaryOp::NotEq => Value::Boolean(!loose_equals(l, r)),
        BinaryOp::StrictEq => Value::Boolean(strict_equals(l, r)),
        BinaryOp::StrictNotEq => Value::Boolean(!strict_equals(l, r)),
    };
    Ok(value)
}
