use crate::core::Value;

#[derive(thiserror::Error, Debug)]
pub enum JSError {
    /// An interpreted `throw`. Recoverable only by an interpreted `catch`.
    #[error("Uncaught {value:?}")]
    Throw { value: Value },

    #[error("Type error: {message}")]
    TypeError { message: String },

    #[error("Reference error: {message}")]
    ReferenceError { message: String },

    /// Structural misuse of the AST (labeling an unsupported node kind,
    /// `await`/`yield` outside a suspendable body). Fatal for the script.
    #[error("Syntax error: {message}")]
    SyntaxError { message: String },

    /// A break/continue that escaped every enclosing construct.
    #[error("Runtime error: {message}")]
    RuntimeError { message: String },

    /// Misuse of a coroutine handle (resuming a running coroutine,
    /// pulling from a consumer that went away).
    #[error("Coroutine error: {message}")]
    CoroutineState { message: String },

    /// Return injected into a suspended coroutine. Internal control signal:
    /// it unwinds like a throw (so `finally` blocks run) but converts back
    /// into a Return completion at the first statement boundary.
    #[doc(hidden)]
    #[error("coroutine return")]
    CoroutineReturn { value: Value },

    /// The coroutine's consumer dropped its handle while the body was
    /// suspended. Internal signal: the worker unwinds WITHOUT running any
    /// interpreted code (no finally blocks, no iterator closing) since
    /// nothing is rendezvousing with it anymore.
    #[doc(hidden)]
    #[error("coroutine detached")]
    Detached,

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl JSError {
    /// Whether an interpreted `catch` clause may observe this error.
    /// Interpreted throws and protocol errors (TypeError/ReferenceError
    /// class) are catchable; host and internal errors are not.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            JSError::Throw { .. } | JSError::TypeError { .. } | JSError::ReferenceError { .. }
        )
    }

    /// The value an interpreted `catch` binds for this error. Protocol
    /// errors materialize as error objects carrying `name` and `message`.
    pub fn thrown_value(&self) -> Value {
        match self {
            JSError::Throw { value } => value.clone(),
            JSError::TypeError { message } => crate::core::error_object("TypeError", message),
            JSError::ReferenceError { message } => crate::core::error_object("ReferenceError", message),
            _ => Value::Undefined,
        }
    }
}

#[macro_export]
macro_rules! raise_type_error {
    ($msg:expr) => {
        $crate::JSError::TypeError { message: $msg.to_string() }
    };
}

#[macro_export]
macro_rules! raise_reference_error {
    ($msg:expr) => {
        $crate::JSError::ReferenceError { message: $msg.to_string() }
    };
}

#[macro_export]
macro_rules! raise_syntax_error {
    ($msg:expr) => {
        $crate::JSError::SyntaxError { message: $msg.to_string() }
    };
}
