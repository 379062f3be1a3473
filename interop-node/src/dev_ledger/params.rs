//! Decoding of JSON call parameters into contract argument types.

use chain_clients_common::{Bytes32, ConnectorError, EvmAddress};
use serde_json::Value;

fn missing(method: &str, index: usize, name: &str) -> ConnectorError {
    ConnectorError::Rejected(format!("{}: missing argument #{} ({})", method, index, name))
}

fn invalid(method: &str, name: &str, value: &Value) -> ConnectorError {
    ConnectorError::Rejected(format!("{}: invalid {}: {}", method, name, value))
}

fn arg<'a>(params: &'a [Value], method: &str, index: usize, name: &str) -> Result<&'a Value, ConnectorError> {
    params.get(index).ok_or_else(|| missing(method, index, name))
}

/// Parses a uint argument: a JSON number, a decimal string or a `0x` hex string.
pub fn uint(params: &[Value], method: &str, index: usize, name: &str) -> Result<u64, ConnectorError> {
    let value = arg(params, method, index, name)?;
    value_to_u64(value).ok_or_else(|| invalid(method, name, value))
}

pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

pub fn bytes32(params: &[Value], method: &str, index: usize, name: &str) -> Result<Bytes32, ConnectorError> {
    let value = arg(params, method, index, name)?;
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(method, name, value))
}

pub fn bytes32_array(
    params: &[Value],
    method: &str,
    index: usize,
    name: &str,
) -> Result<Vec<Bytes32>, ConnectorError> {
    let value = arg(params, method, index, name)?;
    let items = value.as_array().ok_or_else(|| invalid(method, name, value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| invalid(method, name, item))
        })
        .collect()
}

pub fn address(params: &[Value], method: &str, index: usize, name: &str) -> Result<EvmAddress, ConnectorError> {
    let value = arg(params, method, index, name)?;
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(method, name, value))
}

/// Parses a string argument; numbers are accepted and rendered as decimal.
pub fn string(params: &[Value], method: &str, index: usize, name: &str) -> Result<String, ConnectorError> {
    let value = arg(params, method, index, name)?;
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(method, name, value)),
    }
}

pub fn any(params: &[Value], method: &str, index: usize, name: &str) -> Result<Value, ConnectorError> {
    arg(params, method, index, name).cloned()
}
