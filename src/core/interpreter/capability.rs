//! User and request capabilities exposed to policy expressions
//!
//! Policies read the caller through `$user` and the live request through
//! `$request`. Accessors are published under the names policy authors write
//! (`$user.getRole`, `$request.getIpAddress`, `$request.getPath`), with plain
//! property aliases (`role`, `ipAddress`, `path`).

use super::value::{Capability, Value};
use std::sync::Arc;

/// The authenticated principal behind a request
pub trait UserIdentity: Send + Sync {
    fn role(&self) -> String;
}

/// The request being authorized
pub trait RequestInfo: Send + Sync {
    fn ip_address(&self) -> String;
    fn path(&self) -> String;
}

/// Plain user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAttributes {
    pub role: String,
}

impl UserAttributes {
    pub fn new(role: impl Into<String>) -> Self {
        UserAttributes { role: role.into() }
    }
}

impl UserIdentity for UserAttributes {
    fn role(&self) -> String {
        self.role.clone()
    }
}

/// Plain request record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttributes {
    pub ip_address: String,
    pub path: String,
}

impl RequestAttributes {
    pub fn new(ip_address: impl Into<String>, path: impl Into<String>) -> Self {
        RequestAttributes {
            ip_address: ip_address.into(),
            path: path.into(),
        }
    }
}

impl RequestInfo for RequestAttributes {
    fn ip_address(&self) -> String {
        self.ip_address.clone()
    }

    fn path(&self) -> String {
        self.path.clone()
    }
}

/// `$user` capability
pub struct UserCapability(Arc<dyn UserIdentity>);

impl Capability for UserCapability {
    fn type_name(&self) -> &str {
        "user"
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "getRole" => {
                let user = Arc::clone(&self.0);
                Some(Value::function("getRole", move |_| Ok(Value::from(user.role()))))
            }
            "role" => Some(Value::from(self.0.role())),
            _ => None,
        }
    }
}

/// `$request` capability
pub struct RequestCapability(Arc<dyn RequestInfo>);

impl Capability for RequestCapability {
    fn type_name(&self) -> &str {
        "request"
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "getIpAddress" => {
                let request = Arc::clone(&self.0);
                Some(Value::function("getIpAddress", move |_| {
                    Ok(Value::from(request.ip_address()))
                }))
            }
            "getPath" => {
                let request = Arc::clone(&self.0);
                Some(Value::function("getPath", move |_| Ok(Value::from(request.path()))))
            }
            "ipAddress" => Some(Value::from(self.0.ip_address())),
            "path" => Some(Value::from(self.0.path())),
            _ => None,
        }
    }
}

/// Caller-supplied inputs to a single decision
#[derive(Clone)]
pub struct DecisionInput {
    user: Arc<dyn UserIdentity>,
    request: Arc<dyn RequestInfo>,
}

impl DecisionInput {
    pub fn new(user: impl UserIdentity + 'static, request: impl RequestInfo + 'static) -> Self {
        DecisionInput {
            user: Arc::new(user),
            request: Arc::new(request),
        }
    }

    pub fn from_shared(user: Arc<dyn UserIdentity>, request: Arc<dyn RequestInfo>) -> Self {
        DecisionInput { user, request }
    }

    /// Live request path, used for policy path matching
    pub fn request_path(&self) -> String {
        self.request.path()
    }

    /// `$user` value
    pub fn user_value(&self) -> Value {
        Value::Object(Arc::new(UserCapability(Arc::clone(&self.user))))
    }

    /// `$request` value
    pub fn request_value(&self) -> Value {
        Value::Object(Arc::new(RequestCapability(Arc::clone(&self.request))))
    }
}

impl std::fmt::Debug for DecisionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionInput")
            .field("role", &self.user.role())
            .field("ip_address", &self.request.ip_address())
            .field("path", &self.request.path())
            .finish()
    }
}
