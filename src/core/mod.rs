pub mod expr;
pub mod statement;
pub mod value;
pub mod scope;
pub mod eval;
pub mod iterator;

pub use expr::*;
pub use statement::*;
pub use value::*;
pub use scope::{Binding, ScopeData, ScopeKind, ScopeRef, function_scope, new_child, new_scope, scope_declare};
pub use eval::*;
pub use iterator::*;

use crate::js_coroutine::SuspendPoint;
use crate::js_promise::JobQueue;

/// Evaluation context threaded through every evaluator: the shared job
/// queue, the suspension channel of the coroutine currently running (if
/// any), and the kind of the enclosing function body, which decides
/// whether `await`/`yield` are legal and which iteration mode `yield*`
/// uses.
#[derive(Clone)]
pub struct EvalCtx {
    pub jobs: JobQueue,
    pub suspend: Option<SuspendPoint>,
    pub kind: FunctionKind,
}

impl EvalCtx {
    /// Context for top-level script evaluation and plain function bodies.
    pub fn top_level(jobs: JobQueue) -> Self {
        EvalCtx {
            jobs,
            suspend: None,
            kind: FunctionKind::Normal,
        }
    }

    /// Context a coroutine worker evaluates its body under.
    pub fn for_coroutine(jobs: JobQueue, suspend: SuspendPoint, kind: FunctionKind) -> Self {
        EvalCtx {
            jobs,
            suspend: Some(suspend),
            kind,
        }
    }

    /// Context for calling a nested plain function: same job queue, but
    /// no suspension capability leaks into the callee.
    pub fn for_plain_call(&self) -> Self {
        EvalCtx::top_level(self.jobs.clone())
    }
}
