//! Predefined functions available to rule expressions
//!
//! - `in(value, candidate, ...)` - membership test using typed equality
//! - `ip_range(address, range, ...)` - address falls in any CIDR range or equals
//!   any single address (IPv4 and IPv6)

use super::value::Value;
use crate::error::Result;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Registry of predefined identifiers, shared read-only by every decision
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    entries: BTreeMap<String, Value>,
}

impl Builtins {
    /// Registry with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with `in` and `ip_range`
    pub fn standard() -> Self {
        let mut builtins = Self::empty();
        builtins.register_function("in", in_fn);
        builtins.register_function("ip_range", ip_range_fn);
        builtins
    }

    /// Register a native function under `name`, replacing any previous entry
    pub fn register_function<F>(&mut self, name: &str, call: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.insert(name.to_string(), Value::function(name, call));
    }

    /// Register a constant value under `name`
    pub fn register_value(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Whether `name` resolves to a callable
    pub fn is_function(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Value::Function(_)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn in_fn(arguments: &[Value]) -> Result<Value> {
    let Some((value, candidates)) = arguments.split_first() else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(candidates.iter().any(|c| c.strict_eq(value))))
}

fn ip_range_fn(arguments: &[Value]) -> Result<Value> {
    let Some((address, ranges)) = arguments.split_first() else {
        return Ok(Value::Bool(false));
    };
    let Some(address) = address.as_str() else {
        return Ok(Value::Bool(false));
    };
    let matched = ranges
        .iter()
        .filter_map(Value::as_str)
        .any(|range| ip_in_range(address, range));
    Ok(Value::Bool(matched))
}

/// Check an address against a CIDR block (`10.0.0.0/8`) or a single address.
/// Malformed input never matches.
pub fn ip_in_range(address: &str, range: &str) -> bool {
    let Ok(address) = address.trim().parse::<IpAddr>() else {
        return false;
    };

    let (network, prefix) = match range.trim().split_once('/') {
        Some((network, bits)) => match bits.trim().parse::<u8>() {
            Ok(bits) => (network, Some(bits)),
            Err(_) => return false,
        },
        None => (range.trim(), None),
    };
    let Ok(network) = network.trim().parse::<IpAddr>() else {
        return false;
    };

    match (address, network) {
        (IpAddr::V4(a), IpAddr::V4(n)) => v4_in_range(a, n, prefix),
        (IpAddr::V6(a), IpAddr::V6(n)) => v6_in_range(a, n, prefix),
        (IpAddr::V6(a), IpAddr::V4(n)) => a
            .to_ipv4_mapped()
            .is_some_and(|a| v4_in_range(a, n, prefix)),
        (IpAddr::V4(a), IpAddr::V6(n)) => v6_in_range(a.to_ipv6_mapped(), n, prefix),
    }
}

fn v4_in_range(address: Ipv4Addr, network: Ipv4Addr, prefix: Option<u8>) -> bool {
    let prefix = prefix.unwrap_or(32);
    if prefix > 32 {
        return false;
    }
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    u32::from(address) & mask == u32::from(network) & mask
}

fn v6_in_range(address: Ipv6Addr, network: Ipv6Addr, prefix: Option<u8>) -> bool {
    let prefix = prefix.unwrap_or(128);
    if prefix > 128 {
        return false;
    }
    let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
    u128::from(address) & mask == u128::from(network) & mask
}
