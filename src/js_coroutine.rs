//! The suspension driver. Each coroutine is a worker thread parked on a
//! zero-capacity rendezvous channel pair: resuming sends one
//! [`ResumeSignal`] and blocks until the worker pauses again with one
//! [`PauseSignal`]. Exactly one side runs at any instant, so interpreted
//! execution stays a single logical thread even though suspended bodies
//! live on parked threads.

use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::JSError;
use crate::core::{EvalCtx, FunctionData, ObjectRef, Value, lock};

/// What the consumer injects at a suspension point.
#[derive(Debug)]
pub enum ResumeSignal {
    Next(Value),
    Throw(Value),
    Return(Value),
}

/// What a paused coroutine reports to its driver.
pub enum PauseSignal {
    /// `yield value` reached the consumer.
    Yield(Value),
    /// `await` on a pending promise; resume when it settles.
    Await(ObjectRef),
    /// The body completed (returned or fell off the end).
    Done(Value),
    /// The body failed with an interpreted throw or a host error.
    Failed(JSError),
}

/// The worker-side half of the rendezvous, carried in [`EvalCtx`] while a
/// coroutine body runs.
#[derive(Clone)]
pub struct SuspendPoint {
    pause_tx: Sender<PauseSignal>,
    resume_rx: Receiver<ResumeSignal>,
}

impl SuspendPoint {
    /// Park at a suspension point and wait for the next injection. A
    /// disconnected channel means the consumer dropped its handle: the
    /// worker unwinds via the Detached signal, which runs no interpreted
    /// cleanup.
    pub fn pause(&self, signal: PauseSignal) -> Result<ResumeSignal, JSError> {
        self.pause_tx.send(signal).map_err(|_| JSError::Detached)?;
        self.resume_rx.recv().map_err(|_| JSError::Detached)
    }
}

impl EvalCtx {
    /// Suspend at a `yield`, returning the raw injection so `yield*`
    /// delegation can forward it into the delegated iterator.
    pub fn suspend_yield_raw(&self, value: Value) -> Result<ResumeSignal, JSError> {
        let point = self.suspend.as_ref().ok_or_else(|| JSError::SyntaxError {
            message: "yield outside of a generator body".to_string(),
        })?;
        point.pause(PauseSignal::Yield(value))
    }

    /// Suspend at a plain `yield`: an injected throw unwinds as a thrown
    /// exception, an injected return unwinds as a Return completion (via
    /// the CoroutineReturn signal) so enclosing `finally` blocks run.
    pub fn suspend_yield(&self, value: Value) -> Result<Value, JSError> {
        match self.suspend_yield_raw(value)? {
            ResumeSignal::Next(v) => Ok(v),
            ResumeSignal::Throw(v) => Err(JSError::Throw { value: v }),
            ResumeSignal::Return(v) => Err(JSError::CoroutineReturn { value: v }),
        }
    }

    /// `await value`. Plain values and settled promises continue
    /// synchronously; a pending promise parks the coroutine until the
    /// driver resumes it on settlement.
    pub fn await_value(&self, value: Value) -> Result<Value, JSError> {
        if !self.kind.is_async() {
            return Err(JSError::SyntaxError {
                message: "await outside of an async body".to_string(),
            });
        }
        let Some(promise) = crate::js_promise::as_promise(&value) else {
            return Ok(value);
        };
        match crate::js_promise::promise_result(&promise) {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(JSError::Throw { value: e }),
            None => {
                let point = self.suspend.as_ref().ok_or_else(|| JSError::SyntaxError {
                    message: "await outside of an async body".to_string(),
                })?;
                match point.pause(PauseSignal::Await(promise))? {
                    ResumeSignal::Next(v) => Ok(v),
                    ResumeSignal::Throw(v) => Err(JSError::Throw { value: v }),
                    ResumeSignal::Return(v) => Err(JSError::CoroutineReturn { value: v }),
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoroutineStatus {
    NotStarted,
    Suspended,
    Running,
    Completed,
}

/// Driver-side handle to a suspended body. Dropping it disconnects the
/// channels, which unparks and retires the worker without running any
/// interpreted code.
pub struct Coroutine {
    resume_tx: Sender<ResumeSignal>,
    pause_rx: Receiver<PauseSignal>,
    pub status: CoroutineStatus,
}

pub type CoroutineRef = Arc<Mutex<Coroutine>>;

/// Spawn the worker for a suspendable function body. The body does not
/// start running until the first resume.
pub fn spawn_coroutine(ctx: &EvalCtx, function: Arc<FunctionData>, this: Value, args: Vec<Value>) -> CoroutineRef {
    let (pause_tx, pause_rx) = bounded(0);
    let (resume_tx, resume_rx) = bounded(0);
    let jobs = ctx.jobs.clone();
    let kind = function.kind;
    let point = SuspendPoint {
        pause_tx: pause_tx.clone(),
        resume_rx,
    };

    let spawned = thread::Builder::new().name("jsexec-coroutine".to_string()).spawn(move || {
        // Park until the consumer performs the first pull.
        let first = match point.resume_rx.recv() {
            Ok(signal) => signal,
            Err(_) => return,
        };
        let signal = match first {
            ResumeSignal::Next(_) => {
                let ctx = EvalCtx::for_coroutine(jobs, point.clone(), kind);
                match crate::core::eval::run_function_body(&ctx, &function, this, args) {
                    Ok(value) => PauseSignal::Done(value),
                    Err(JSError::CoroutineReturn { value }) => PauseSignal::Done(value),
                    Err(e) => PauseSignal::Failed(e),
                }
            }
            // Closed before the body ever ran: nothing to unwind.
            ResumeSignal::Return(v) => PauseSignal::Done(v),
            ResumeSignal::Throw(v) => PauseSignal::Failed(JSError::Throw { value: v }),
        };
        if pause_tx.send(signal).is_err() {
            log::trace!("coroutine finished after its consumer went away");
        }
    });
    if let Err(e) = spawned {
        log::error!("failed to spawn coroutine worker: {e}");
    }

    Arc::new(Mutex::new(Coroutine {
        resume_tx,
        pause_rx,
        status: CoroutineStatus::NotStarted,
    }))
}

/// One rendezvous step: inject `signal`, block until the worker pauses
/// again. Injecting into a running coroutine is a host error; injecting
/// into a completed one reports the coroutine gone.
pub fn resume(co: &CoroutineRef, signal: ResumeSignal) -> Result<PauseSignal, JSError> {
    let (resume_tx, pause_rx) = {
        let mut guard = lock(co);
        match guard.status {
            CoroutineStatus::Running => {
                return Err(JSError::CoroutineState {
                    message: "cannot resume a coroutine that is already running".to_string(),
                });
            }
            CoroutineStatus::Completed => {
                return Err(JSError::CoroutineState {
                    message: "cannot resume a completed coroutine".to_string(),
                });
            }
            CoroutineStatus::NotStarted | CoroutineStatus::Suspended => {}
        }
        guard.status = CoroutineStatus::Running;
        (guard.resume_tx.clone(), guard.pause_rx.clone())
    };

    log::trace!("resuming coroutine with {signal:?}");
    if resume_tx.send(signal).is_err() {
        lock(co).status = CoroutineStatus::Completed;
        return Err(JSError::CoroutineState {
            message: "coroutine worker is gone".to_string(),
        });
    }
    match pause_rx.recv() {
        Ok(pause) => {
            lock(co).status = match pause {
                PauseSignal::Done(_) | PauseSignal::Failed(_) => CoroutineStatus::Completed,
                _ => CoroutineStatus::Suspended,
            };
            Ok(pause)
        }
        Err(_) => {
            lock(co).status = CoroutineStatus::Completed;
            Err(JSError::CoroutineState {
                message: "coroutine worker is gone".to_string(),
            })
        }
    }
}

pub fn coroutine_status(co: &CoroutineRef) -> CoroutineStatus {
    lock(co).status
}
