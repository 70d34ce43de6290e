//! Async function calls. The body runs synchronously up to its first
//! `await` on a pending promise, then the call returns a pending result
//! promise; settlement of the awaited promise re-enters the body through
//! the job queue until the body completes and settles the result.

use std::sync::Arc;

use crate::core::value::{FunctionData, Value};
use crate::core::EvalCtx;
use crate::js_coroutine::{CoroutineRef, PauseSignal, ResumeSignal, resume, spawn_coroutine};
use crate::js_promise::{Reaction, add_reaction, settle};
use crate::JSError;

pub fn call_async_function(ctx: &EvalCtx, function: Arc<FunctionData>, this: Value, args: Vec<Value>) -> Result<Value, JSError> {
    log::trace!("calling async function {:?}", function.name);
    let co = spawn_coroutine(ctx, function, this, args);
    let result = crate::js_promise::new_promise();
    // run the body up to its first suspension before handing back the promise
    async_step(ctx, &co, &result, ResumeSignal::Next(Value::Undefined))?;
    Ok(Value::Object(result))
}

/// Drive an async-function coroutine one rendezvous step. Awaits on
/// settled promises resume synchronously inside the body, so a pause
/// always means a genuinely pending promise: park a reaction on it and
/// yield back to the caller.
pub fn async_step(
    ctx: &EvalCtx,
    co: &CoroutineRef,
    result: &crate::core::ObjectRef,
    signal: ResumeSignal,
) -> Result<(), JSError> {
    match resume(co, signal)? {
        PauseSignal::Await(promise) => {
            add_reaction(
                ctx,
                &promise,
                Reaction::AsyncResume {
                    co: co.clone(),
                    result: result.clone(),
                },
            );
            Ok(())
        }
        PauseSignal::Done(value) => {
            settle(ctx, result, Ok(value));
            Ok(())
        }
        PauseSignal::Failed(e) => {
            if e.is_catchable() {
                // uncaught interpreted throw becomes the rejection
                settle(ctx, result, Err(e.thrown_value()));
                Ok(())
            } else {
                // host errors are not representable as rejections
                Err(e)
            }
        }
        PauseSignal::Yield(_) => Err(JSError::CoroutineState {
            message: "async function body attempted to yield".to_string(),
        }),
    }
}
