//! The iteration protocol adapter: one handle type over sync iterables,
//! async iterables, strings, array-likes, and manual iterator objects,
//! so the for-of/for-await-of evaluators and `yield*` delegation speak a
//! single protocol. Closing on abnormal exit is part of the contract —
//! dropping a handle without closing it leaks a suspended interpreted
//! generator.

use std::collections::HashSet;

use crate::core::EvalCtx;
use crate::core::eval::{call_value, get_property};
use crate::core::value::{
    ObjectKind, ObjectRef, SYM_ASYNC_ITERATOR, SYM_ITERATOR, Value, array_like_length, has_async_iterator,
    has_sync_iterator, is_array_like, is_callable, lock, own_enumerable_keys, to_boolean, value_to_string,
};
use crate::js_coroutine::ResumeSignal;
use crate::{JSError, raise_type_error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterMode {
    Sync,
    Async,
}

pub struct IterStep {
    pub value: Value,
    pub done: bool,
}

pub struct IteratorHandle {
    mode: IterMode,
    done: bool,
    inner: IterInner,
}

enum IterInner {
    /// Snapshot sequence (string code points).
    Values { items: Vec<Value>, index: usize },
    /// Index-based walk over an array or array-like; length read live.
    Indexed { object: ObjectRef, index: usize },
    /// Interpreted generator object.
    Generator { r#gen: ObjectRef },
    /// Interpreted async generator object (async mode only).
    AsyncGenerator { r#gen: ObjectRef },
    /// Manual iterator object exposing `next`/`return`/`throw` methods.
    /// `wrap_sync` marks a sync iterator used under for-await, whose step
    /// values must cross the suspension boundary through an await.
    Object { iter: ObjectRef, wrap_sync: bool },
}

/// §4.2 resolution. Async mode prefers the async-iterator capability,
/// falls back to wrapping a sync iterator, then to index-synthesized
/// iteration over strings and array-likes. Sync mode accepts only the
/// sync-iterator capability.
pub fn get_iterator(ctx: &EvalCtx, value: &Value, mode: IterMode) -> Result<IteratorHandle, JSError> {
    let inner = match mode {
        IterMode::Async => {
            if has_async_iterator(value) {
                async_inner(ctx, value)?
            } else if has_sync_iterator(value) {
                sync_inner(ctx, value, true)?
            } else if is_array_like(value) {
                match value {
                    Value::Object(obj) => IterInner::Indexed { object: obj.clone(), index: 0 },
                    _ => return Err(not_iterable(value)),
                }
            } else {
                return Err(not_iterable(value));
            }
        }
        IterMode::Sync => {
            if has_sync_iterator(value) {
                sync_inner(ctx, value, false)?
            } else {
                return Err(not_iterable(value));
            }
        }
    };
    Ok(IteratorHandle { mode, done: false, inner })
}

fn not_iterable(value: &Value) -> JSError {
    raise_type_error!(format!("{} is not iterable", value_to_string(value)))
}

fn sync_inner(ctx: &EvalCtx, value: &Value, wrap_sync: bool) -> Result<IterInner, JSError> {
    match value {
        Value::String(s) => Ok(IterInner::Values {
            items: s.chars().map(|c| Value::from(c.to_string())).collect(),
            index: 0,
        }),
        Value::Object(obj) => {
            let kind_inner = {
                let data = lock(obj);
                match &data.kind {
                    ObjectKind::Array(_) => Some(IterInner::Indexed { object: obj.clone(), index: 0 }),
                    ObjectKind::Generator(_) => Some(IterInner::Generator { r#gen: obj.clone() }),
                    _ => None,
                }
            };
            if let Some(inner) = kind_inner {
                return Ok(inner);
            }
            let method = get_property(ctx, value, SYM_ITERATOR)?;
            if !is_callable(&method) {
                return Err(not_iterable(value));
            }
            let iter = call_value(ctx, &method, value.clone(), vec![])?;
            match iter {
                Value::Object(iter) => Ok(IterInner::Object { iter, wrap_sync }),
                _ => Err(raise_type_error!("iterator is not an object")),
            }
        }
        _ => Err(not_iterable(value)),
    }
}

fn async_inner(ctx: &EvalCtx, value: &Value) -> Result<IterInner, JSError> {
    let Value::Object(obj) = value else {
        return Err(not_iterable(value));
    };
    if matches!(lock(obj).kind, ObjectKind::AsyncGenerator(_)) {
        return Ok(IterInner::AsyncGenerator { r#gen: obj.clone() });
    }
    let method = get_property(ctx, value, SYM_ASYNC_ITERATOR)?;
    if !is_callable(&method) {
        return Err(not_iterable(value));
    }
    let iter = call_value(ctx, &method, value.clone(), vec![])?;
    match iter {
        Value::Object(iter) => Ok(IterInner::Object { iter, wrap_sync: false }),
        _ => Err(raise_type_error!("async iterator is not an object")),
    }
}

impl IteratorHandle {
    /// One loop advance: `Some(value)` or `None` once exhausted. In async
    /// mode the step waits (awaits) as the source requires.
    pub fn step(&mut self, ctx: &EvalCtx) -> Result<Option<Value>, JSError> {
        if self.done {
            return Ok(None);
        }
        let step = self.advance(ctx, ResumeSignal::Next(Value::Undefined))?;
        if step.done {
            Ok(None)
        } else {
            Ok(Some(step.value))
        }
    }

    /// Forward an injection into the iterator — the shared primitive
    /// behind loop advance and `yield*` delegation.
    pub fn advance(&mut self, ctx: &EvalCtx, signal: ResumeSignal) -> Result<IterStep, JSError> {
        let result = self.advance_inner(ctx, signal);
        match &result {
            Ok(step) if step.done => self.done = true,
            Err(_) => self.done = true,
            _ => {}
        }
        result
    }

    fn advance_inner(&mut self, ctx: &EvalCtx, signal: ResumeSignal) -> Result<IterStep, JSError> {
        let awaited = self.mode == IterMode::Async;
        match &mut self.inner {
            IterInner::Values { items, index } => match signal {
                ResumeSignal::Next(_) => {
                    if *index < items.len() {
                        let mut value = items[*index].clone();
                        *index += 1;
                        if awaited {
                            value = ctx.await_value(value)?;
                        }
                        Ok(IterStep { value, done: false })
                    } else {
                        Ok(IterStep { value: Value::Undefined, done: true })
                    }
                }
                ResumeSignal::Throw(v) => Err(JSError::Throw { value: v }),
                ResumeSignal::Return(v) => Ok(IterStep { value: v, done: true }),
            },
            IterInner::Indexed { object, index } => match signal {
                ResumeSignal::Next(_) => {
                    let length = array_like_length(object);
                    if *index < length {
                        let key = index.to_string();
                        *index += 1;
                        let mut value = get_property(ctx, &Value::Object(object.clone()), &key)?;
                        if awaited {
                            value = ctx.await_value(value)?;
                        }
                        Ok(IterStep { value, done: false })
                    } else {
                        Ok(IterStep { value: Value::Undefined, done: true })
                    }
                }
                ResumeSignal::Throw(v) => Err(JSError::Throw { value: v }),
                ResumeSignal::Return(v) => Ok(IterStep { value: v, done: true }),
            },
            IterInner::Generator { r#gen } => {
                let mut step = match signal {
                    ResumeSignal::Next(v) => crate::js_generator::generator_next(ctx, r#gen, v)?,
                    ResumeSignal::Throw(v) => crate::js_generator::generator_throw(ctx, r#gen, v)?,
                    ResumeSignal::Return(v) => crate::js_generator::generator_return(ctx, r#gen, v)?,
                };
                if awaited && !step.done {
                    step.value = ctx.await_value(step.value)?;
                }
                Ok(step)
            }
            IterInner::AsyncGenerator { r#gen } => {
                let promise = crate::js_async_generator::async_generator_request(ctx, r#gen, signal)?;
                let result = ctx.await_value(Value::Object(promise))?;
                parse_iter_result(ctx, result)
            }
            IterInner::Object { iter, wrap_sync } => {
                let iter_value = Value::Object(iter.clone());
                let wrap_sync = *wrap_sync;
                let (method_name, arg) = match &signal {
                    ResumeSignal::Next(v) => ("next", v.clone()),
                    ResumeSignal::Throw(v) => ("throw", v.clone()),
                    ResumeSignal::Return(v) => ("return", v.clone()),
                };
                let method = get_property(ctx, &iter_value, method_name)?;
                if !is_callable(&method) {
                    return match signal {
                        ResumeSignal::Next(_) => Err(raise_type_error!("iterator has no next method")),
                        ResumeSignal::Throw(_) => {
                            // close before reporting the protocol violation
                            self.done = true;
                            let _ = close_object_iterator(ctx, &iter_value, awaited && !wrap_sync);
                            Err(raise_type_error!("iterator has no throw method"))
                        }
                        // a missing return method completes the iterator as-is
                        ResumeSignal::Return(v) => Ok(IterStep { value: v, done: true }),
                    };
                }
                let mut result = call_value(ctx, &method, iter_value, vec![arg])?;
                if awaited && !wrap_sync {
                    result = ctx.await_value(result)?;
                }
                let mut step = parse_iter_result(ctx, result)?;
                if awaited && wrap_sync && !step.done {
                    step.value = ctx.await_value(step.value)?;
                }
                Ok(step)
            }
        }
    }

    /// Close before exhaustion: invoke the optional close capability,
    /// awaited in async mode. Errors surface to the caller.
    pub fn close(&mut self, ctx: &EvalCtx) -> Result<(), JSError> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.do_close(ctx)
    }

    /// Close after an abnormal exit that already carries an error: the
    /// original error takes precedence, close-time failures are logged.
    pub fn close_on_error(&mut self, ctx: &EvalCtx, original: &JSError) {
        if self.done || matches!(original, JSError::Detached) {
            return;
        }
        self.done = true;
        if let Err(close_err) = self.do_close(ctx) {
            log::debug!("iterator close failed while unwinding {original:?}: {close_err:?}");
        }
    }

    fn do_close(&mut self, ctx: &EvalCtx) -> Result<(), JSError> {
        match &self.inner {
            IterInner::Values { .. } | IterInner::Indexed { .. } => Ok(()),
            IterInner::Generator { r#gen } => {
                crate::js_generator::generator_return(ctx, r#gen, Value::Undefined)?;
                Ok(())
            }
            IterInner::AsyncGenerator { r#gen } => {
                let promise =
                    crate::js_async_generator::async_generator_request(ctx, r#gen, ResumeSignal::Return(Value::Undefined))?;
                ctx.await_value(Value::Object(promise))?;
                Ok(())
            }
            IterInner::Object { iter, wrap_sync } => {
                let awaited = self.mode == IterMode::Async && !*wrap_sync;
                close_object_iterator(ctx, &Value::Object(iter.clone()), awaited)
            }
        }
    }
}

fn close_object_iterator(ctx: &EvalCtx, iter: &Value, awaited: bool) -> Result<(), JSError> {
    let method = get_property(ctx, iter, "return")?;
    if matches!(method, Value::Undefined | Value::Null) {
        return Ok(());
    }
    if !is_callable(&method) {
        return Err(raise_type_error!("iterator return property is not callable"));
    }
    let mut result = call_value(ctx, &method, iter.clone(), vec![Value::Undefined])?;
    if awaited {
        result = ctx.await_value(result)?;
    }
    match result {
        Value::Object(_) => Ok(()),
        _ => Err(raise_type_error!("iterator return did not produce an object")),
    }
}

fn parse_iter_result(ctx: &EvalCtx, result: Value) -> Result<IterStep, JSError> {
    if !matches!(result, Value::Object(_)) {
        return Err(raise_type_error!("iterator result is not an object"));
    }
    let value = get_property(ctx, &result, "value")?;
    let done = to_boolean(&get_property(ctx, &result, "done")?);
    Ok(IterStep { value, done })
}

/// for-in key sequence: own + inherited enumerable string keys, each
/// object contributing integer-like keys in ascending order first, then
/// the rest in insertion order; keys shadowed by a nearer object appear
/// once.
pub fn enumerate_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => {
            let mut seen: HashSet<String> = HashSet::new();
            let mut keys = Vec::new();
            let mut current = Some(obj.clone());
            while let Some(o) = current {
                for key in own_enumerable_keys(&o) {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
                current = lock(&o).prototype.clone();
            }
            keys
        }
        Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}
