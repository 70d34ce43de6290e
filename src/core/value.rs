use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::JSError;
use crate::core::EvalCtx;
use crate::core::expr::FunctionKind;
use crate::core::scope::ScopeRef;
use crate::core::statement::{Pattern, Statement};

pub type ObjectRef = Arc<Mutex<ObjectData>>;

/// Host-provided function: `(ctx, this, args) -> value`. Must be `Send`
/// because interpreted code may call it from a coroutine worker thread.
pub type NativeFn = Arc<dyn Fn(&EvalCtx, Value, &[Value]) -> Result<Value, JSError> + Send + Sync>;

/// Lock a mutex, tolerating poison. All shared state is touched by exactly
/// one logical thread at a time (the rendezvous discipline), so a poisoned
/// lock only means a coroutine worker panicked mid-write; the data is
/// still the best available.
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Arc<str>),
    Object(ObjectRef),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            // shallow on purpose: object graphs may be cyclic
            Value::Object(obj) => write!(f, "[object {}]", lock(obj).kind.tag()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s.as_str()))
    }
}

/// A property slot: plain data, or an accessor pair. Accessors matter to
/// the `with` overlay, which must observe getters/setters live.
#[derive(Clone)]
pub enum Property {
    Data { value: Value, enumerable: bool },
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
        enumerable: bool,
    },
}

impl Property {
    pub fn data(value: Value) -> Self {
        Property::Data { value, enumerable: true }
    }

    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } => *enumerable,
            Property::Accessor { enumerable, .. } => *enumerable,
        }
    }
}

pub struct ObjectData {
    pub properties: IndexMap<String, Property>,
    pub prototype: Option<ObjectRef>,
    pub kind: ObjectKind,
}

pub enum ObjectKind {
    Plain,
    Array(Vec<Value>),
    Function(Arc<FunctionData>),
    Native { name: String, func: NativeFn },
    Promise(crate::js_promise::PromiseData),
    Generator(crate::js_generator::GeneratorData),
    AsyncGenerator(crate::js_async_generator::AsyncGeneratorData),
}

impl ObjectKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Plain => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) | ObjectKind::Native { .. } => "Function",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::Generator(_) => "Generator",
            ObjectKind::AsyncGenerator(_) => "AsyncGenerator",
        }
    }
}

/// An interpreted function: parameters, body, captured scope, and which of
/// the four kinds it is. Shared by reference so coroutine workers can
/// carry it across threads.
pub struct FunctionData {
    pub name: Option<String>,
    pub kind: FunctionKind,
    pub params: Vec<Pattern>,
    pub body: Arc<Vec<Statement>>,
    pub closure: ScopeRef,
}

pub fn new_object(kind: ObjectKind) -> ObjectRef {
    Arc::new(Mutex::new(ObjectData {
        properties: IndexMap::new(),
        prototype: None,
        kind,
    }))
}

pub fn new_plain_object() -> ObjectRef {
    new_object(ObjectKind::Plain)
}

pub fn new_array(elements: Vec<Value>) -> ObjectRef {
    new_object(ObjectKind::Array(elements))
}

pub fn new_native(name: &str, func: NativeFn) -> Value {
    Value::Object(new_object(ObjectKind::Native {
        name: name.to_string(),
        func,
    }))
}

pub fn native_fn<F>(name: &str, f: F) -> Value
where
    F: Fn(&EvalCtx, Value, &[Value]) -> Result<Value, JSError> + Send + Sync + 'static,
{
    new_native(name, Arc::new(f))
}

/// An error object as interpreted `catch` sees protocol errors:
/// `{ name, message }`.
pub fn error_object(name: &str, message: &str) -> Value {
    let obj = new_plain_object();
    {
        let mut data = lock(&obj);
        data.properties.insert("name".to_string(), Property::data(name.into()));
        data.properties.insert("message".to_string(), Property::data(message.into()));
    }
    Value::Object(obj)
}

pub fn set_own_property(obj: &ObjectRef, key: &str, value: Value) {
    lock(obj).properties.insert(key.to_string(), Property::data(value));
}

pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
    }
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Object(_) => f64::NAN,
    }
}

pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Loose equality, restricted to the coercions the control-flow core
/// actually meets (number/string/boolean cross-comparison).
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Number(_), Value::String(_) | Value::Boolean(_))
        | (Value::String(_) | Value::Boolean(_), Value::Number(_))
        | (Value::String(_), Value::Boolean(_))
        | (Value::Boolean(_), Value::String(_)) => to_number(a) == to_number(b),
        _ => strict_equals(a, b),
    }
}

pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null => "object",
        Value::Boolean(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Object(obj) => match lock(obj).kind {
            ObjectKind::Function(_) | ObjectKind::Native { .. } => "function",
            _ => "object",
        },
    }
}

pub fn is_callable(value: &Value) -> bool {
    match value {
        Value::Object(obj) => matches!(lock(obj).kind, ObjectKind::Function(_) | ObjectKind::Native { .. }),
        _ => false,
    }
}

/// Display form used for messages and `console.log`.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e21 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.to_string(),
        Value::Object(obj) => {
            let data = lock(obj);
            match &data.kind {
                ObjectKind::Array(elements) => {
                    let parts: Vec<String> = elements.iter().map(value_to_string).collect();
                    parts.join(",")
                }
                ObjectKind::Function(f) => {
                    format!("function {}", f.name.as_deref().unwrap_or(""))
                }
                ObjectKind::Native { name, .. } => format!("function {name}"),
                _ => format!("[object {}]", data.kind.tag()),
            }
        }
    }
}

/// Well-known keys standing in for the iteration symbols.
pub const SYM_ITERATOR: &str = "@@iterator";
pub const SYM_ASYNC_ITERATOR: &str = "@@asyncIterator";

fn has_property_key(obj: &ObjectRef, key: &str) -> bool {
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let data = lock(&o);
        if data.properties.contains_key(key) {
            return true;
        }
        current = data.prototype.clone();
    }
    false
}

/// Capability query consumed by the iteration adapter: can a sync
/// iterator be obtained from this value?
pub fn has_sync_iterator(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(obj) => {
            let is_builtin = matches!(lock(obj).kind, ObjectKind::Array(_) | ObjectKind::Generator(_));
            is_builtin || has_property_key(obj, SYM_ITERATOR)
        }
        _ => false,
    }
}

pub fn has_async_iterator(value: &Value) -> bool {
    match value {
        Value::Object(obj) => {
            matches!(lock(obj).kind, ObjectKind::AsyncGenerator(_)) || has_property_key(obj, SYM_ASYNC_ITERATOR)
        }
        _ => false,
    }
}

/// Array-like: an object with a numeric own `length` property.
pub fn is_array_like(value: &Value) -> bool {
    match value {
        Value::Object(obj) => {
            let data = lock(obj);
            if matches!(data.kind, ObjectKind::Array(_)) {
                return true;
            }
            matches!(
                data.properties.get("length"),
                Some(Property::Data { value: Value::Number(_), .. })
            )
        }
        _ => false,
    }
}

pub fn array_like_length(obj: &ObjectRef) -> usize {
    let data = lock(obj);
    match &data.kind {
        ObjectKind::Array(elements) => elements.len(),
        _ => match data.properties.get("length") {
            Some(Property::Data { value: Value::Number(n), .. }) if *n >= 0.0 => *n as usize,
            _ => 0,
        },
    }
}

/// Parse a property key as an array index (`"0"`, `"12"`, ...).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<usize>().ok()
}

/// Own enumerable string keys of one object, integer-like keys first in
/// ascending order, the rest in insertion order.
pub fn own_enumerable_keys(obj: &ObjectRef) -> Vec<String> {
    let data = lock(obj);
    let mut integer_keys: Vec<usize> = Vec::new();
    let mut string_keys: Vec<String> = Vec::new();

    if let ObjectKind::Array(elements) = &data.kind {
        integer_keys.extend(0..elements.len());
    }
    for (key, prop) in &data.properties {
        if !prop.enumerable() {
            continue;
        }
        match array_index(key) {
            Some(i) => integer_keys.push(i),
            None => string_keys.push(key.clone()),
        }
    }
    integer_keys.sort_unstable();
    integer_keys.dedup();

    let mut keys: Vec<String> = integer_keys.into_iter().map(|i| i.to_string()).collect();
    keys.extend(string_keys);
    keys
}
