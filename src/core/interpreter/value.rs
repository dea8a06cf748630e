//! Runtime values produced by expression evaluation

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Native callable signature
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named callable value (builtin predicate or capability accessor)
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Function {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with positional arguments
    pub fn call(&self, arguments: &[Value]) -> Result<Value> {
        (self.call)(arguments)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// An externally supplied object exposing named members
///
/// Members are looked up dynamically by name. A member whose value is a
/// [`Value::Function`] is treated as an accessor and invoked with no arguments
/// when read through a member expression. Implementations must be free of
/// side effects and safe to call from several threads at once.
pub trait Capability: Send + Sync {
    /// Short name used in diagnostics
    fn type_name(&self) -> &str;

    /// Look up a member by name
    fn get(&self, key: &str) -> Option<Value>;
}

/// Runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// Result of a member lookup that found nothing
    #[default]
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Function),
    Object(Arc<dyn Capability>),
}

impl Value {
    /// Wrap a native closure as a function value
    pub fn function<F>(name: &str, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Function::new(name, call))
    }

    pub fn object(capability: impl Capability + 'static) -> Self {
        Value::Object(Arc::new(capability))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Object(object) => object.type_name(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Typed equality: same kind and same value, cross-kind is always unequal
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.call, &b.call),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Function(function) => write!(f, "{:?}", function),
            Value::Object(object) => write!(f, "Object({})", object.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Function(function) => write!(f, "{}()", function.name()),
            Value::Object(object) => write!(f, "[{}]", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
