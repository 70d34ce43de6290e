//! The embedding layer: a `Realm` bundles the global scope with the job
//! queue, registers host natives, evaluates programs, and adapts
//! interpreted coroutines to the host — async results are joinable and
//! generators iterate as Rust iterators.

use crate::core::eval::{call_value, evaluate_statements, hoist_var_names};
use crate::core::iterator::IterStep;
use crate::core::scope::{ScopeKind, ScopeRef, new_scope, scope_declare};
use crate::core::statement::Statement;
use crate::core::value::{ObjectRef, Property, Value, lock, native_fn, new_plain_object, value_to_string};
use crate::core::{Completion, EvalCtx};
use crate::js_promise::{JobQueue, as_promise, new_job_queue, promise_resolved, promise_result, run_event_loop, settle};
use crate::JSError;

pub struct Realm {
    globals: ScopeRef,
    ctx: EvalCtx,
}

impl Realm {
    pub fn new() -> Self {
        let jobs: JobQueue = new_job_queue();
        let ctx = EvalCtx::top_level(jobs);
        let globals = new_scope(ScopeKind::Function, None);
        scope_declare(&globals, "undefined", Value::Undefined, false);
        scope_declare(&globals, "NaN", Value::Number(f64::NAN), false);
        scope_declare(&globals, "Infinity", Value::Number(f64::INFINITY), false);
        install_promise_namespace(&globals);
        install_console(&globals);
        Realm { globals, ctx }
    }

    pub fn global_scope(&self) -> &ScopeRef {
        &self.globals
    }

    pub fn ctx(&self) -> &EvalCtx {
        &self.ctx
    }

    pub fn define_global(&self, name: &str, value: Value) {
        scope_declare(&self.globals, name, value, true);
    }

    /// Expose a host function to interpreted code.
    pub fn register_native<F>(&self, name: &str, f: F)
    where
        F: Fn(&EvalCtx, Value, &[Value]) -> Result<Value, JSError> + Send + Sync + 'static,
    {
        self.define_global(name, native_fn(name, f));
    }

    /// Evaluate a program body against the global scope, then drain the
    /// job queue. The result is the last statement's value.
    pub fn evaluate_program(&self, program: &[Statement]) -> Result<Value, JSError> {
        hoist_var_names(&self.globals, program);
        let value = match evaluate_statements(&self.ctx, &self.globals, program)? {
            Completion::Normal(v) | Completion::Return(v) => v,
            Completion::Break(_) => {
                return Err(JSError::RuntimeError {
                    message: "illegal break statement".to_string(),
                });
            }
            Completion::Continue(_) => {
                return Err(JSError::RuntimeError {
                    message: "illegal continue statement".to_string(),
                });
            }
        };
        run_event_loop(&self.ctx)?;
        Ok(value)
    }

    /// Call an interpreted (or native) function value from the host.
    pub fn call(&self, func: &Value, this: Value, args: &[Value]) -> Result<Value, JSError> {
        call_value(&self.ctx, func, this, args.to_vec())
    }

    pub fn run_event_loop(&self) -> Result<(), JSError> {
        run_event_loop(&self.ctx)
    }

    /// A promise the host settles: hand the value to interpreted code,
    /// keep the capability, settle it later, then run the event loop.
    pub fn create_promise_capability(&self) -> (Value, PromiseCapability) {
        let promise = crate::js_promise::new_promise();
        (
            Value::Object(promise.clone()),
            PromiseCapability {
                ctx: self.ctx.clone(),
                promise,
            },
        )
    }

    /// Join a promise from the host: drain jobs, then read its result.
    /// A promise still pending afterwards is waiting on a host stimulus.
    pub fn block_on_promise(&self, value: &Value) -> Result<Value, JSError> {
        run_event_loop(&self.ctx)?;
        let Some(promise) = as_promise(value) else {
            return Ok(value.clone());
        };
        match promise_result(&promise) {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(JSError::Throw { value: e }),
            None => Err(JSError::CoroutineState {
                message: "promise is still pending; it needs an external stimulus".to_string(),
            }),
        }
    }

    /// Iterate an interpreted generator from the host.
    pub fn generator_values(&self, generator: &Value) -> Result<GeneratorValues, JSError> {
        match generator {
            Value::Object(obj) if matches!(lock(obj).kind, crate::core::ObjectKind::Generator(_)) => {
                Ok(GeneratorValues {
                    ctx: self.ctx.clone(),
                    r#gen: obj.clone(),
                    done: false,
                })
            }
            _ => Err(crate::raise_type_error!("value is not a generator object")),
        }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Realm::new()
    }
}

/// Host-side resolver for a promise created by
/// [`Realm::create_promise_capability`].
pub struct PromiseCapability {
    ctx: EvalCtx,
    promise: ObjectRef,
}

impl PromiseCapability {
    pub fn resolve(&self, value: Value) {
        settle(&self.ctx, &self.promise, Ok(value));
    }

    pub fn reject(&self, value: Value) {
        settle(&self.ctx, &self.promise, Err(value));
    }
}

/// Rust-iterator adapter over an interpreted generator, realizing the
/// host-iterable half of the embedding contract.
pub struct GeneratorValues {
    ctx: EvalCtx,
    r#gen: ObjectRef,
    done: bool,
}

impl Iterator for GeneratorValues {
    type Item = Result<Value, JSError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match crate::js_generator::generator_next(&self.ctx, &self.r#gen, Value::Undefined) {
            Ok(IterStep { done: true, .. }) => {
                self.done = true;
                None
            }
            Ok(IterStep { value, .. }) => Some(Ok(value)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// `Promise.resolve` / `Promise.reject` for interpreted code. The full
/// constructor lives with the builtin library collaborator, not here.
fn install_promise_namespace(globals: &ScopeRef) {
    let ns = new_plain_object();
    {
        let mut data = lock(&ns);
        data.properties.insert(
            "resolve".to_string(),
            Property::data(native_fn("resolve", |_ctx, _this, args| {
                let value = args.first().cloned().unwrap_or(Value::Undefined);
                if as_promise(&value).is_some() {
                    return Ok(value);
                }
                Ok(Value::Object(promise_resolved(value)))
            })),
        );
        data.properties.insert(
            "reject".to_string(),
            Property::data(native_fn("reject", |_ctx, _this, args| {
                let value = args.first().cloned().unwrap_or(Value::Undefined);
                Ok(Value::Object(crate::js_promise::promise_rejected(value)))
            })),
        );
    }
    scope_declare(globals, "Promise", Value::Object(ns), false);
}

/// `console.log` and friends route through the `log` facade.
fn install_console(globals: &ScopeRef) {
    let console = new_plain_object();
    {
        let mut data = lock(&console);
        data.properties.insert(
            "log".to_string(),
            Property::data(native_fn("log", |_ctx, _this, args| {
                let line: Vec<String> = args.iter().map(value_to_string).collect();
                log::info!("{}", line.join(" "));
                Ok(Value::Undefined)
            })),
        );
        data.properties.insert(
            "error".to_string(),
            Property::data(native_fn("error", |_ctx, _this, args| {
                let line: Vec<String> = args.iter().map(value_to_string).collect();
                log::error!("{}", line.join(" "));
                Ok(Value::Undefined)
            })),
        );
    }
    scope_declare(globals, "console", Value::Object(console), false);
}
