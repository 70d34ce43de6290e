//! Async generator objects: externally pulled like generators, but every
//! pull answers with a promise, and the body may await internally before
//! yielding. Pulls that arrive while the body is mid-await queue up and
//! are serviced strictly in order.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::value::{FunctionData, ObjectKind, ObjectRef, Value, lock, native_fn, new_object};
use crate::core::EvalCtx;
use crate::core::iterator::IterStep;
use crate::js_coroutine::{CoroutineRef, PauseSignal, ResumeSignal, resume, spawn_coroutine};
use crate::js_generator::iter_result_object;
use crate::js_promise::{Reaction, add_reaction, new_promise, settle};
use crate::{JSError, raise_type_error};

pub struct AsyncGeneratorData {
    pub co: CoroutineRef,
    pub done: bool,
    /// Requests not yet handed to the body, serviced in arrival order.
    pub queue: VecDeque<(ResumeSignal, ObjectRef)>,
    /// The request whose answer the body is currently computing.
    pub current: Option<ObjectRef>,
}

pub fn create_async_generator(ctx: &EvalCtx, function: Arc<FunctionData>, this: Value, args: Vec<Value>) -> Value {
    log::trace!("creating async generator {:?}", function.name);
    let co = spawn_coroutine(ctx, function, this, args);
    Value::Object(new_object(ObjectKind::AsyncGenerator(AsyncGeneratorData {
        co,
        done: false,
        queue: VecDeque::new(),
        current: None,
    })))
}

fn with_data<R>(r#gen: &ObjectRef, f: impl FnOnce(&mut AsyncGeneratorData) -> R) -> Result<R, JSError> {
    let mut data = lock(r#gen);
    match &mut data.kind {
        ObjectKind::AsyncGenerator(g) => Ok(f(g)),
        _ => Err(raise_type_error!("receiver is not an async generator")),
    }
}

fn settle_done_request(ctx: &EvalCtx, request: &ObjectRef, signal: ResumeSignal) {
    match signal {
        ResumeSignal::Next(_) => settle(
            ctx,
            request,
            Ok(iter_result_object(&IterStep { value: Value::Undefined, done: true })),
        ),
        ResumeSignal::Return(v) => settle(ctx, request, Ok(iter_result_object(&IterStep { value: v, done: true }))),
        ResumeSignal::Throw(v) => settle(ctx, request, Err(v)),
    }
}

/// Enqueue a `next`/`return`/`throw` request. Returns the promise that
/// will settle with this request's `{value, done}` result.
pub fn async_generator_request(ctx: &EvalCtx, r#gen: &ObjectRef, signal: ResumeSignal) -> Result<ObjectRef, JSError> {
    let request = new_promise();
    if with_data(r#gen, |g| g.done)? {
        settle_done_request(ctx, &request, signal);
        return Ok(request);
    }
    with_data(r#gen, |g| g.queue.push_back((signal, request.clone())))?;
    pump(ctx, r#gen)?;
    Ok(request)
}

/// Hand queued requests to the body while it is not mid-await.
fn pump(ctx: &EvalCtx, r#gen: &ObjectRef) -> Result<(), JSError> {
    loop {
        let next = with_data(r#gen, |g| {
            if g.done || g.current.is_some() {
                None
            } else {
                g.queue.pop_front().inspect(|(_, rp)| {
                    g.current = Some(rp.clone());
                })
            }
        })?;
        let Some((signal, _request)) = next else { return Ok(()) };
        drive(ctx, r#gen, signal)?;
    }
}

/// Resume the body once and translate its pause into request traffic.
/// Called both from `pump` and from the job queue when an awaited
/// promise settles.
pub fn async_generator_step(ctx: &EvalCtx, r#gen: &ObjectRef, signal: ResumeSignal) -> Result<(), JSError> {
    drive(ctx, r#gen, signal)?;
    pump(ctx, r#gen)
}

fn drive(ctx: &EvalCtx, r#gen: &ObjectRef, signal: ResumeSignal) -> Result<(), JSError> {
    let co = with_data(r#gen, |g| g.co.clone())?;
    match resume(&co, signal)? {
        PauseSignal::Yield(v) => {
            let request = with_data(r#gen, |g| g.current.take())?;
            if let Some(request) = request {
                settle(ctx, &request, Ok(iter_result_object(&IterStep { value: v, done: false })));
            }
            Ok(())
        }
        PauseSignal::Await(promise) => {
            // current request stays pending until the body yields or ends
            add_reaction(ctx, &promise, Reaction::AsyncGenResume { r#gen: r#gen.clone() });
            Ok(())
        }
        PauseSignal::Done(v) => {
            let (request, rest) = with_data(r#gen, |g| {
                g.done = true;
                (g.current.take(), std::mem::take(&mut g.queue))
            })?;
            if let Some(request) = request {
                settle(ctx, &request, Ok(iter_result_object(&IterStep { value: v, done: true })));
            }
            for (signal, pending) in rest {
                settle_done_request(ctx, &pending, signal);
            }
            Ok(())
        }
        PauseSignal::Failed(e) => {
            let (request, rest) = with_data(r#gen, |g| {
                g.done = true;
                (g.current.take(), std::mem::take(&mut g.queue))
            })?;
            if !e.is_catchable() {
                return Err(e);
            }
            if let Some(request) = request {
                settle(ctx, &request, Err(e.thrown_value()));
            }
            for (signal, pending) in rest {
                settle_done_request(ctx, &pending, signal);
            }
            Ok(())
        }
    }
}

/// The `next`/`return`/`throw` methods exposed on async generator
/// objects; each returns a promise of `{value, done}`.
pub fn async_generator_method(r#gen: &ObjectRef, key: &str) -> Option<Value> {
    let target = r#gen.clone();
    match key {
        "next" => Some(native_fn("next", move |ctx, _this, args| {
            let p = async_generator_request(ctx, &target, ResumeSignal::Next(args.first().cloned().unwrap_or(Value::Undefined)))?;
            Ok(Value::Object(p))
        })),
        "return" => Some(native_fn("return", move |ctx, _this, args| {
            let p = async_generator_request(ctx, &target, ResumeSignal::Return(args.first().cloned().unwrap_or(Value::Undefined)))?;
            Ok(Value::Object(p))
        })),
        "throw" => Some(native_fn("throw", move |ctx, _this, args| {
            let p = async_generator_request(ctx, &target, ResumeSignal::Throw(args.first().cloned().unwrap_or(Value::Undefined)))?;
            Ok(Value::Object(p))
        })),
        _ => None,
    }
}
