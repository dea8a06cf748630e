//! # RuBAC - Rule-Based Access Control Engine
//!
//! `rubac-rs` decides whether a request is allowed by evaluating JSON-declared
//! policy documents written in a small expression language:
//!
//! - **Compiled once**: every expression is lexed, parsed and statically
//!   checked at load time, so unknown functions and undeclared variables never
//!   reach a decision
//! - **Path scoped**: each policy covers a path pattern; `*` matches the rest
//! - **Typed evaluation**: equality compares values directly, with no string
//!   evaluation of user input
//! - **Lock-free decisions** over an immutable registry that can be swapped
//!   on reload
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rubac::{DecisionInput, PolicyService, RequestAttributes, Result, ServiceConfig, UserAttributes};
//!
//! # fn main() -> Result<()> {
//! let service = PolicyService::load(ServiceConfig::new("policies"))?;
//!
//! let input = DecisionInput::new(
//!     UserAttributes::new("ADMIN"),
//!     RequestAttributes::new("100.100.100.100", "/admin/w1"),
//! );
//! if service.decide(&input, "1") {
//!     // allow
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Expressions
//!
//! ```rust
//! use rubac::workflow::{CompiledWorkflow, PolicyDocument, RuleFold};
//! use rubac::{Builtins, DecisionInput, RequestAttributes, UserAttributes};
//!
//! let doc = PolicyDocument::from_json(r#"{
//!     "WorkflowID": 2,
//!     "WorkflowName": "Office network admins",
//!     "Path": "admin/*",
//!     "Params": [
//!         { "Name": "ip", "Expression": "$request.getIpAddress" },
//!         { "Name": "role", "Expression": "$user.getRole" }
//!     ],
//!     "Rules": [
//!         { "RuleName": "Office range", "Expression": "ip_range($ip, '10.1.0.0/16')" },
//!         { "RuleName": "Admins", "Expression": "in($role, 'ADMIN', 'SUPER_ADMIN')" }
//!     ]
//! }"#).unwrap();
//!
//! let builtins = Builtins::standard();
//! let workflow = CompiledWorkflow::compile(&doc, &builtins).unwrap();
//!
//! let input = DecisionInput::new(
//!     UserAttributes::new("SUPER_ADMIN"),
//!     RequestAttributes::new("10.1.4.20", "/admin/users"),
//! );
//! assert!(workflow.decide(&input, &builtins, RuleFold::Strict).unwrap());
//! ```

pub mod core;
pub mod error;

pub use crate::core::{interpreter, lang, service, workflow};

pub use crate::core::interpreter::{
    Builtins, DecisionInput, RequestAttributes, RequestInfo, UserAttributes, UserIdentity, Value,
};
pub use crate::core::lang::{parse, tokenize, AstNode};
pub use crate::core::service::{PolicyService, ServiceConfig, WorkflowRegistry};
pub use crate::core::workflow::{CompiledWorkflow, PolicyDocument, RuleFold};
pub use crate::error::{Result, RubacError};
