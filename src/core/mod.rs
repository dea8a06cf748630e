//! Policy language toolchain and evaluation service

pub mod interpreter;
pub mod lang;
pub mod service;
pub mod workflow;
