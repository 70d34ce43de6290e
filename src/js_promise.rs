//! Minimal promise state machine plus the job queue that sequences
//! coroutine resumptions. Settlement never runs interpreted code inline:
//! it translates reactions into jobs which `run_event_loop` drains one at
//! a time, so suspended coroutines only ever resume between jobs, never
//! inside one another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::JSError;
use crate::core::{EvalCtx, ObjectKind, ObjectRef, Value, lock, new_object};
use crate::js_coroutine::{CoroutineRef, ResumeSignal};

pub struct PromiseData {
    pub state: PromiseState,
}

pub enum PromiseState {
    Pending { reactions: Vec<Reaction> },
    Fulfilled(Value),
    Rejected(Value),
}

/// What to do when a pending promise settles. First-order data rather
/// than closures so reactions can cross coroutine worker threads.
pub enum Reaction {
    /// Resume a suspended async-function body, then settle `result` when
    /// it completes.
    AsyncResume { co: CoroutineRef, result: ObjectRef },
    /// Resume the async generator currently awaiting inside its body.
    AsyncGenResume { r#gen: ObjectRef },
    /// Forward the settlement into another promise (resolve-with-promise
    /// chaining).
    Forward { target: ObjectRef },
}

pub enum Job {
    AsyncStep {
        co: CoroutineRef,
        result: ObjectRef,
        signal: ResumeSignal,
    },
    AsyncGenStep {
        r#gen: ObjectRef,
        signal: ResumeSignal,
    },
    Settle {
        promise: ObjectRef,
        outcome: Result<Value, Value>,
    },
}

pub type JobQueue = Arc<Mutex<VecDeque<Job>>>;

pub fn new_job_queue() -> JobQueue {
    Arc::new(Mutex::new(VecDeque::new()))
}

pub fn enqueue_job(ctx: &EvalCtx, job: Job) {
    lock(&ctx.jobs).push_back(job);
}

pub fn new_promise() -> ObjectRef {
    new_object(ObjectKind::Promise(PromiseData {
        state: PromiseState::Pending { reactions: Vec::new() },
    }))
}

pub fn promise_resolved(value: Value) -> ObjectRef {
    new_object(ObjectKind::Promise(PromiseData {
        state: PromiseState::Fulfilled(value),
    }))
}

pub fn promise_rejected(value: Value) -> ObjectRef {
    new_object(ObjectKind::Promise(PromiseData {
        state: PromiseState::Rejected(value),
    }))
}

pub fn as_promise(value: &Value) -> Option<ObjectRef> {
    match value {
        Value::Object(obj) if matches!(lock(obj).kind, ObjectKind::Promise(_)) => Some(obj.clone()),
        _ => None,
    }
}

/// `Some(Ok)/Some(Err)` once settled, `None` while pending.
pub fn promise_result(promise: &ObjectRef) -> Option<Result<Value, Value>> {
    let data = lock(promise);
    match &data.kind {
        ObjectKind::Promise(p) => match &p.state {
            PromiseState::Pending { .. } => None,
            PromiseState::Fulfilled(v) => Some(Ok(v.clone())),
            PromiseState::Rejected(v) => Some(Err(v.clone())),
        },
        _ => None,
    }
}

fn reaction_job(reaction: Reaction, outcome: &Result<Value, Value>) -> Job {
    let signal = match outcome {
        Ok(v) => ResumeSignal::Next(v.clone()),
        Err(e) => ResumeSignal::Throw(e.clone()),
    };
    match reaction {
        Reaction::AsyncResume { co, result } => Job::AsyncStep { co, result, signal },
        Reaction::AsyncGenResume { r#gen } => Job::AsyncGenStep { r#gen, signal },
        Reaction::Forward { target } => Job::Settle {
            promise: target,
            outcome: outcome.clone(),
        },
    }
}

/// Attach a reaction; if the promise already settled, the reaction goes
/// straight onto the job queue.
pub fn add_reaction(ctx: &EvalCtx, promise: &ObjectRef, reaction: Reaction) {
    let settled = {
        let mut data = lock(promise);
        match &mut data.kind {
            ObjectKind::Promise(p) => match &mut p.state {
                PromiseState::Pending { reactions } => {
                    reactions.push(reaction);
                    return;
                }
                PromiseState::Fulfilled(v) => Ok(v.clone()),
                PromiseState::Rejected(v) => Err(v.clone()),
            },
            _ => return,
        }
    };
    enqueue_job(ctx, reaction_job(reaction, &settled));
}

/// Settle a promise. Resolving with another promise chains instead of
/// nesting; settling an already-settled promise is a no-op.
pub fn settle(ctx: &EvalCtx, promise: &ObjectRef, outcome: Result<Value, Value>) {
    if let Ok(value) = &outcome
        && let Some(inner) = as_promise(value)
        && !Arc::ptr_eq(&inner, promise)
    {
        match promise_result(&inner) {
            Some(result) => return settle(ctx, promise, result),
            None => {
                add_reaction(ctx, &inner, Reaction::Forward { target: promise.clone() });
                return;
            }
        }
    }

    let reactions = {
        let mut data = lock(promise);
        match &mut data.kind {
            ObjectKind::Promise(p) => {
                if !matches!(p.state, PromiseState::Pending { .. }) {
                    log::debug!("ignoring settlement of an already-settled promise");
                    return;
                }
                let drained = match &mut p.state {
                    PromiseState::Pending { reactions } => std::mem::take(reactions),
                    _ => Vec::new(),
                };
                p.state = match &outcome {
                    Ok(v) => PromiseState::Fulfilled(v.clone()),
                    Err(e) => PromiseState::Rejected(e.clone()),
                };
                drained
            }
            _ => return,
        }
    };
    for reaction in reactions {
        let job = reaction_job(reaction, &outcome);
        enqueue_job(ctx, job);
    }
}

/// Drain the job queue. Each job resumes at most one coroutine, which
/// runs until its next suspension point before the loop continues.
pub fn run_event_loop(ctx: &EvalCtx) -> Result<(), JSError> {
    loop {
        let job = lock(&ctx.jobs).pop_front();
        let Some(job) = job else { break };
        match job {
            Job::AsyncStep { co, result, signal } => {
                log::trace!("event loop: resuming async function");
                crate::js_async::async_step(ctx, &co, &result, signal)?;
            }
            Job::AsyncGenStep { r#gen, signal } => {
                log::trace!("event loop: resuming async generator");
                crate::js_async_generator::async_generator_step(ctx, &r#gen, signal)?;
            }
            Job::Settle { promise, outcome } => {
                settle(ctx, &promise, outcome);
            }
        }
    }
    Ok(())
}
