use crate::function::Function;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

// Case-insensitive global registry, keyed by uppercase name.
static REG: Lazy<DashMap<String, Arc<dyn Function>>> = Lazy::new(DashMap::new);

// Built-ins register exactly once, on first lookup.
static BUILTINS: Lazy<()> = Lazy::new(crate::builtins::register_builtins);

#[inline]
fn norm<S: AsRef<str>>(s: S) -> String {
    s.as_ref().to_uppercase()
}

pub fn register_function(f: Arc<dyn Function>) {
    REG.insert(norm(f.name()), f);
}

pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    Lazy::force(&BUILTINS);
    REG.get(&norm(name)).map(|v| Arc::clone(v.value()))
}

/// A host-provided bundle of additional functions, consulted before the
/// global registry so hosts can also shadow a built-in.
#[derive(Default)]
pub struct FunctionRegistry {
    map: DashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, f: Arc<dyn Function>) {
        self.map.insert(norm(f.name()), f);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.map.get(&norm(name)).map(|v| Arc::clone(v.value()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
