//! Interpreted generator objects: a coroutine-backed object driven by an
//! external consumer's `next`/`return`/`throw` calls. Injected returns
//! and throws land at the suspension point, so enclosing `finally`
//! blocks run before the generator settles.

use std::sync::Arc;

use crate::core::iterator::IterStep;
use crate::core::value::{FunctionData, ObjectKind, ObjectRef, Property, Value, lock, native_fn, new_object, new_plain_object};
use crate::core::EvalCtx;
use crate::js_coroutine::{CoroutineRef, PauseSignal, ResumeSignal, resume, spawn_coroutine};
use crate::{JSError, raise_type_error};

pub struct GeneratorData {
    pub co: CoroutineRef,
    pub done: bool,
}

/// Calling a generator function builds the generator object; the body
/// does not run until the first pull.
pub fn create_generator(ctx: &EvalCtx, function: Arc<FunctionData>, this: Value, args: Vec<Value>) -> Value {
    log::trace!("creating generator {:?}", function.name);
    let co = spawn_coroutine(ctx, function, this, args);
    Value::Object(new_object(ObjectKind::Generator(GeneratorData { co, done: false })))
}

fn generator_parts(r#gen: &ObjectRef) -> Result<(CoroutineRef, bool), JSError> {
    let data = lock(r#gen);
    match &data.kind {
        ObjectKind::Generator(g) => Ok((g.co.clone(), g.done)),
        _ => Err(raise_type_error!("receiver is not a generator")),
    }
}

fn mark_done(r#gen: &ObjectRef) {
    if let ObjectKind::Generator(g) = &mut lock(r#gen).kind {
        g.done = true;
    }
}

/// One consumer-driven step. A completed generator answers further pulls
/// with `{undefined, done: true}`, echoes injected returns, and rethrows
/// injected throws.
pub fn generator_resume(ctx: &EvalCtx, r#gen: &ObjectRef, signal: ResumeSignal) -> Result<IterStep, JSError> {
    let _ = ctx;
    let (co, done) = generator_parts(r#gen)?;
    if done {
        return match signal {
            ResumeSignal::Next(_) => Ok(IterStep { value: Value::Undefined, done: true }),
            ResumeSignal::Return(v) => Ok(IterStep { value: v, done: true }),
            ResumeSignal::Throw(v) => Err(JSError::Throw { value: v }),
        };
    }
    match resume(&co, signal)? {
        PauseSignal::Yield(v) => Ok(IterStep { value: v, done: false }),
        PauseSignal::Done(v) => {
            mark_done(r#gen);
            Ok(IterStep { value: v, done: true })
        }
        PauseSignal::Failed(e) => {
            mark_done(r#gen);
            Err(e)
        }
        PauseSignal::Await(_) => {
            mark_done(r#gen);
            Err(JSError::CoroutineState {
                message: "plain generator body attempted to await".to_string(),
            })
        }
    }
}

pub fn generator_next(ctx: &EvalCtx, r#gen: &ObjectRef, value: Value) -> Result<IterStep, JSError> {
    generator_resume(ctx, r#gen, ResumeSignal::Next(value))
}

pub fn generator_return(ctx: &EvalCtx, r#gen: &ObjectRef, value: Value) -> Result<IterStep, JSError> {
    generator_resume(ctx, r#gen, ResumeSignal::Return(value))
}

pub fn generator_throw(ctx: &EvalCtx, r#gen: &ObjectRef, value: Value) -> Result<IterStep, JSError> {
    generator_resume(ctx, r#gen, ResumeSignal::Throw(value))
}

/// `{value, done}` as interpreted code observes iterator results.
pub fn iter_result_object(step: &IterStep) -> Value {
    let obj = new_plain_object();
    {
        let mut data = lock(&obj);
        data.properties.insert("value".to_string(), Property::data(step.value.clone()));
        data.properties
            .insert("done".to_string(), Property::data(Value::Boolean(step.done)));
    }
    Value::Object(obj)
}

/// The `next`/`return`/`throw` methods exposed on generator objects.
pub fn generator_method(r#gen: &ObjectRef, key: &str) -> Option<Value> {
    let target = r#gen.clone();
    match key {
        "next" => Some(native_fn("next", move |ctx, _this, args| {
            let step = generator_next(ctx, &target, args.first().cloned().unwrap_or(Value::Undefined))?;
            Ok(iter_result_object(&step))
        })),
        "return" => Some(native_fn("return", move |ctx, _this, args| {
            let step = generator_return(ctx, &target, args.first().cloned().unwrap_or(Value::Undefined))?;
            Ok(iter_result_object(&step))
        })),
        "throw" => Some(native_fn("throw", move |ctx, _this, args| {
            let step = generator_throw(ctx, &target, args.first().cloned().unwrap_or(Value::Undefined))?;
            Ok(iter_result_object(&step))
        })),
        _ => None,
    }
}
