//! Interpreter for policy expressions
//!
//! Two independent capabilities over the same syntax tree:
//! - [`evaluate`] computes a runtime [`Value`] against an [`ExecutionEnvironment`]
//! - [`visit`] walks the tree in pre-order for static checks

mod builtins;
mod capability;
mod environment;
mod eval;
mod value;
mod visitor;

pub use builtins::{ip_in_range, Builtins};
pub use capability::{
    DecisionInput, RequestAttributes, RequestCapability, RequestInfo, UserAttributes,
    UserCapability, UserIdentity,
};
pub use environment::{ExecutionEnvironment, CONTEXT_VARIABLES, REQUEST_VARIABLE, USER_VARIABLE};
pub use eval::evaluate;
pub use value::{Capability, Function, NativeFn, Value};
pub use visitor::{visit, VisitContext, Visitor};
