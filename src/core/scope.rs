use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::core::value::{ObjectRef, Value, lock};

pub type ScopeRef = Arc<Mutex<ScopeData>>;

/// What a frame means to name resolution. `Function` frames are the
/// boundary `var` and `this` bind at; `With` frames forward lookups to a
/// live object instead of holding bindings of their own.
pub enum ScopeKind {
    Function,
    Block,
    With(ObjectRef),
}

pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

pub struct ScopeData {
    pub kind: ScopeKind,
    pub bindings: IndexMap<String, Binding>,
    pub parent: Option<ScopeRef>,
}

pub fn new_scope(kind: ScopeKind, parent: Option<ScopeRef>) -> ScopeRef {
    Arc::new(Mutex::new(ScopeData {
        kind,
        bindings: IndexMap::new(),
        parent,
    }))
}

pub fn new_child(parent: &ScopeRef, kind: ScopeKind) -> ScopeRef {
    new_scope(kind, Some(parent.clone()))
}

/// Declare (or redeclare) a binding in this exact frame.
pub fn scope_declare(scope: &ScopeRef, name: &str, value: Value, mutable: bool) {
    lock(scope)
        .bindings
        .insert(name.to_string(), Binding { value, mutable });
}

/// The nearest enclosing `Function` frame, or the outermost frame when
/// none is marked (the global scope is a `Function` frame in practice).
pub fn function_scope(scope: &ScopeRef) -> ScopeRef {
    let mut current = scope.clone();
    loop {
        let parent = {
            let data = lock(&current);
            if matches!(data.kind, ScopeKind::Function) {
                return current.clone();
            }
            data.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => return current,
        }
    }
}

/// Read a binding from the plain lexical chain, skipping `with` overlays.
/// The overlay-aware path lives in the evaluator, which can run getters.
pub fn scope_get_plain(scope: &ScopeRef, name: &str) -> Option<Value> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        let data = lock(&s);
        if let Some(binding) = data.bindings.get(name) {
            return Some(binding.value.clone());
        }
        current = data.parent.clone();
    }
    None
}
