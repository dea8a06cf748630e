//! Policy documents and their compiled form

mod compiler;
mod document;
mod pattern;


pub use compiler::{CompiledWorkflow, ParamDefinition, RuleDefinition, RuleFold};
pub use document::{ParamDeclaration, PolicyDocument, RuleDeclaration};
pub use pattern::{PathPattern, WILDCARD};
