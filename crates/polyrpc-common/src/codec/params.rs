//! Argument lists on the wire.
//!
//! Clients write `params` as:
//!
//! - nothing, for zero arguments;
//! - the bare argument, for exactly one argument (wrapped in a one-element array
//!   when the argument is itself an array, so it cannot be mistaken for a list
//!   of arguments);
//! - an array, for two or more arguments.
//!
//! Servers are more lenient so peers written against other conventions still
//! work: a single argument may also arrive as a one-element array or as an
//! object keyed by the parameter name, and multiple arguments may arrive as an
//! object keyed by parameter names. A one-key object is decoded whole before
//! it is read as keyed by the parameter name.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::decode;
use crate::protocol::error::RpcError;

/// Builds the `params` member for a call with the given encoded arguments.
pub fn encode_params(mut args: Vec<Value>) -> Option<Value> {
    match args.len() {
        0 => None,
        1 => match args.pop() {
            Some(Value::Array(items)) => Some(Value::Array(vec![Value::Array(items)])),
            single => single,
        },
        _ => Some(Value::Array(args)),
    }
}

/// Decoded argument list of one request, consumed in declaration order.
///
/// # Example
///
/// ```
/// use polyrpc_common::codec::Params;
/// use serde_json::json;
///
/// let mut params = Params::parse(&["a", "b"], Some(json!({"b": 3, "a": 2}))).unwrap();
/// let a: i64 = params.take().unwrap();
/// let b: i64 = params.take().unwrap();
/// assert_eq!((a, b), (2, 3));
///
/// assert!(Params::parse(&["a", "b"], Some(json!([1]))).is_err());
/// ```
#[derive(Debug)]
pub struct Params {
    names: &'static [&'static str],
    values: std::vec::IntoIter<Value>,
    fallback: Option<Value>,
    position: usize,
}

impl Params {
    /// Checks `params` against the declared parameter names.
    ///
    /// Arity mismatches fail here, before any argument is decoded.
    pub fn parse(names: &'static [&'static str], params: Option<Value>) -> Result<Self, RpcError> {
        let (values, fallback) = match names.len() {
            0 => (Self::parse_empty(params)?, None),
            1 => Self::parse_single(names[0], params)?,
            arity => (Self::parse_many(names, arity, params)?, None),
        };

        Ok(Self {
            names,
            values: values.into_iter(),
            fallback,
            position: 0,
        })
    }

    /// Decodes the next argument.
    pub fn take<T: DeserializeOwned>(&mut self) -> Result<T, RpcError> {
        let name = self.names.get(self.position).copied().unwrap_or("?");
        self.position += 1;

        let value = self
            .values
            .next()
            .ok_or_else(|| RpcError::internal(format!("argument `{}` requested twice", name)))?;

        match decode::<T>(value) {
            Ok(arg) => Ok(arg),
            Err(err) => match self.fallback.take() {
                Some(whole) => decode::<T>(whole).map_err(|_| invalid_argument(name, err)),
                None => Err(invalid_argument(name, err)),
            },
        }
    }

    fn parse_empty(params: Option<Value>) -> Result<Vec<Value>, RpcError> {
        match params {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) if items.is_empty() => Ok(Vec::new()),
            Some(Value::Object(map)) if map.is_empty() => Ok(Vec::new()),
            Some(_) => Err(RpcError::invalid_params("expected no arguments")),
        }
    }

    fn parse_single(
        name: &str,
        params: Option<Value>,
    ) -> Result<(Vec<Value>, Option<Value>), RpcError> {
        match params {
            None => Err(RpcError::invalid_params(format!(
                "expected 1 argument (`{}`), got none",
                name
            ))),
            Some(Value::Array(items)) if items.len() == 1 => {
                let whole = Value::Array(items.clone());
                Ok((items, Some(whole)))
            }
            // A bare record comes first: it is what polyrpc clients send
            Some(Value::Object(map)) if map.len() == 1 && map.contains_key(name) => {
                let keyed = map.get(name).cloned();
                Ok((vec![Value::Object(map)], keyed))
            }
            Some(value) => Ok((vec![value], None)),
        }
    }

    fn parse_many(
        names: &[&str],
        arity: usize,
        params: Option<Value>,
    ) -> Result<Vec<Value>, RpcError> {
        match params {
            Some(Value::Array(items)) if items.len() == arity => Ok(items),
            Some(Value::Array(items)) => Err(RpcError::invalid_params(format!(
                "expected {} arguments ({}), got {}",
                arity,
                names.join(", "),
                items.len()
            ))),
            Some(Value::Object(map)) => Self::by_name(names, map),
            _ => Err(RpcError::invalid_params(format!(
                "expected {} arguments ({})",
                arity,
                names.join(", ")
            ))),
        }
    }

    fn by_name(names: &[&str], mut map: Map<String, Value>) -> Result<Vec<Value>, RpcError> {
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            let value = map
                .remove(*name)
                .ok_or_else(|| RpcError::invalid_params(format!("missing argument `{}`", name)))?;
            values.push(value);
        }

        if let Some(extra) = map.keys().next() {
            return Err(RpcError::invalid_params(format!(
                "unexpected argument `{}`",
                extra
            )));
        }

        Ok(values)
    }
}

fn invalid_argument(name: &str, err: super::DecodeError) -> RpcError {
    RpcError::invalid_params(format!("invalid argument `{}`: {}", name, err))
}
