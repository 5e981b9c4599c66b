//! Expression evaluation: the tree-walking evaluator, the function
//! registry with compile-time self-registration, and the builtin
//! scalar functions.

pub mod evaluator;
pub mod function_metadata;
pub mod functions;

pub use evaluator::{CompiledExpr, ExprVm, ExpressionEvaluator, Resolved};
pub use function_metadata::{FunctionDescriptor, FunctionHandler, FunctionRegistry};
pub use functions::BuiltinScalars;
