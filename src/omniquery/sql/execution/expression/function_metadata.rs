//! Function metadata and self-registration.
//!
//! Scalar functions register themselves at compile time through the
//! inventory pattern; [`FunctionRegistry::global`] exposes them as a
//! process-wide table. Embedders needing an isolated function set can
//! build their own [`FunctionRegistry`] handle instead.
//!
//! Registration is expected to be finalized before evaluation begins;
//! adding functions while queries are running is undefined.

use crate::omniquery::sql::error::SqlError;
use crate::omniquery::sql::execution::context::ReadContext;
use crate::omniquery::sql::execution::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, RwLock};

/// Function handler signature.
///
/// The evaluation context arrives first, followed by the evaluated
/// argument values. The boolean result marks whether the value is
/// defined for these inputs: `false` means "skip this column" in
/// projection and "false" in a predicate.
pub type FunctionHandler =
    fn(Option<&dyn ReadContext>, &[Value]) -> Result<(Value, bool), SqlError>;

/// An invocable function: name, expected argument count, handler.
#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Exact argument count, or `None` for variadic functions
    pub arity: Option<usize>,
    pub handler: FunctionHandler,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, arity: Option<usize>, handler: FunctionHandler) -> Self {
        Self {
            name: name.into().to_lowercase(),
            arity,
            handler,
        }
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for FunctionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Compile-time registration record for a scalar function.
pub struct ScalarFunctionDef {
    pub name: &'static str,
    pub arity: Option<usize>,
    pub handler: FunctionHandler,
}

inventory::collect!(ScalarFunctionDef);

/// Register a scalar function with the global registry.
///
/// # Example
/// ```rust,ignore
/// crate::register_scalar_function!(
///     name: "sqrt",
///     arity: Some(1),
///     handler: BuiltinScalars::sqrt
/// );
/// ```
#[macro_export]
macro_rules! register_scalar_function {
    (name: $name:expr, arity: $arity:expr, handler: $handler:path) => {
        inventory::submit! {
            $crate::omniquery::sql::execution::expression::function_metadata::ScalarFunctionDef {
                name: $name,
                arity: $arity,
                handler: $handler,
            }
        }
    };
}

/// Table from function name to descriptor.
///
/// Lookups are case-insensitive (names are keyed lowercased).
pub struct FunctionRegistry {
    funcs: RwLock<HashMap<String, FunctionDescriptor>>,
}

impl FunctionRegistry {
    /// An empty registry, for embedders bringing their own functions.
    pub fn new() -> Self {
        Self {
            funcs: RwLock::new(HashMap::new()),
        }
    }

    /// A registry seeded with every self-registered function.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for def in inventory::iter::<ScalarFunctionDef> {
            registry.register(FunctionDescriptor::new(def.name, def.arity, def.handler));
        }
        registry
    }

    /// The process-wide registry, seeded from compile-time
    /// registrations on first access.
    pub fn global() -> &'static FunctionRegistry {
        static GLOBAL: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::with_builtins);
        &GLOBAL
    }

    /// Install a descriptor, replacing any previous one of that name.
    pub fn register(&self, descriptor: FunctionDescriptor) {
        let mut funcs = self.funcs.write().unwrap();
        funcs.insert(descriptor.name.clone(), descriptor);
    }

    /// Install a function by parts.
    pub fn add(&self, name: &str, arity: Option<usize>, handler: FunctionHandler) {
        self.register(FunctionDescriptor::new(name, arity, handler));
    }

    /// Look up a function by name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<FunctionDescriptor> {
        let funcs = self.funcs.read().unwrap();
        funcs.get(&name.to_lowercase()).cloned()
    }

    /// Sorted names of every registered function.
    pub fn names(&self) -> Vec<String> {
        let funcs = self.funcs.read().unwrap();
        let mut names: Vec<String> = funcs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_one(
        _ctx: Option<&dyn ReadContext>,
        _args: &[Value],
    ) -> Result<(Value, bool), SqlError> {
        Ok((Value::Int(1), true))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        registry.add("MyFunc", Some(0), always_one);
        assert!(registry.get("myfunc").is_some());
        assert!(registry.get("MYFUNC").is_some());
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn test_global_contains_builtins() {
        let registry = FunctionRegistry::global();
        for name in ["count", "sqrt", "pow"] {
            assert!(registry.get(name).is_some(), "missing builtin {}", name);
        }
    }

    #[test]
    fn test_register_replaces() {
        let registry = FunctionRegistry::new();
        registry.add("f", Some(1), always_one);
        registry.add("f", Some(2), always_one);
        assert_eq!(registry.get("f").unwrap().arity, Some(2));
        assert_eq!(registry.names(), vec!["f".to_string()]);
    }
}
