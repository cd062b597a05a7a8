//! Argument extraction for asynchronous methods.
//!
//! Host arguments are copied into owned, `Send` data on the interpreter
//! thread before any work is submitted. Two views are kept:
//!
//! - grouped vectors (`strings`, `numbers`, `bools`, `buffers`) in
//!   positional order within each kind, with arrays flattened by element
//!   kind;
//! - a positional view of [`ArgValue`]s for handlers that need structure.
//!
//! Values with no data representation (plain objects, functions, promises,
//! errors, host objects) are rejected rather than dropped.

use crate::error::{BridgeError, BridgeResult};
use crate::host::HostValue;

/// Owned copy of one host argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// `undefined` or `null`.
    Absent,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// String.
    String(String),
    /// Copied `ArrayBuffer` contents.
    Bytes(Vec<u8>),
    /// Array elements.
    List(Vec<ArgValue>),
}

impl ArgValue {
    fn from_host(method: &str, index: usize, value: &HostValue) -> BridgeResult<Self> {
        Ok(match value {
            HostValue::Undefined | HostValue::Null => Self::Absent,
            HostValue::Bool(b) => Self::Bool(*b),
            HostValue::Number(n) => Self::Number(*n),
            HostValue::String(s) => Self::String(s.clone()),
            HostValue::ArrayBuffer(b) => Self::Bytes(b.to_vec()),
            HostValue::Array(a) => Self::List(
                a.to_vec()
                    .iter()
                    .map(|item| Self::from_host(method, index, item))
                    .collect::<BridgeResult<Vec<_>>>()?,
            ),
            other => {
                return Err(BridgeError::argument(
                    method,
                    format!("argument {index} has unsupported type {}", other.type_name()),
                ));
            },
        })
    }
}

/// Arguments of one asynchronous call, ready to cross to a worker thread.
#[derive(Debug, Clone, Default)]
pub struct AsyncArgs {
    method: String,
    positional: Vec<ArgValue>,
    strings: Vec<String>,
    numbers: Vec<f64>,
    bools: Vec<bool>,
    buffers: Vec<Vec<u8>>,
}

impl AsyncArgs {
    /// Copy `args` out of the realm.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Argument`] if any argument (or array element)
    /// has no data representation.
    pub fn extract(method: &str, args: &[HostValue]) -> BridgeResult<Self> {
        let positional = args
            .iter()
            .enumerate()
            .map(|(i, v)| ArgValue::from_host(method, i, v))
            .collect::<BridgeResult<Vec<_>>>()?;
        Ok(Self::from_positional(method, positional))
    }

    /// Build from already-owned positional values.
    #[must_use]
    pub fn from_positional(method: &str, positional: Vec<ArgValue>) -> Self {
        let mut args = Self {
            method: method.to_owned(),
            ..Self::default()
        };
        for value in &positional {
            args.group(value);
        }
        args.positional = positional;
        args
    }

    fn group(&mut self, value: &ArgValue) {
        match value {
            ArgValue::Absent => {},
            ArgValue::Bool(b) => self.bools.push(*b),
            ArgValue::Number(n) => self.numbers.push(*n),
            ArgValue::String(s) => self.strings.push(s.clone()),
            ArgValue::Bytes(b) => self.buffers.push(b.clone()),
            ArgValue::List(items) => {
                for item in items {
                    self.group(item);
                }
            },
        }
    }

    /// Method these arguments were extracted for.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// All string arguments in order.
    #[must_use]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// All numeric arguments in order.
    #[must_use]
    pub fn numbers(&self) -> &[f64] {
        &self.numbers
    }

    /// All boolean arguments in order.
    #[must_use]
    pub fn bools(&self) -> &[bool] {
        &self.bools
    }

    /// All buffer arguments in order.
    #[must_use]
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// The `i`-th string argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error if there are fewer than `i + 1` strings.
    pub fn string(&self, i: usize) -> BridgeResult<&str> {
        self.strings
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| self.missing("string", i))
    }

    /// The `i`-th string argument, or `default`.
    #[must_use]
    pub fn string_or<'a>(&'a self, i: usize, default: &'a str) -> &'a str {
        self.strings.get(i).map_or(default, String::as_str)
    }

    /// The `i`-th numeric argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error if there are fewer than `i + 1` numbers.
    pub fn number(&self, i: usize) -> BridgeResult<f64> {
        self.numbers
            .get(i)
            .copied()
            .ok_or_else(|| self.missing("number", i))
    }

    /// The `i`-th numeric argument, or `default`.
    #[must_use]
    pub fn number_or(&self, i: usize, default: f64) -> f64 {
        self.numbers.get(i).copied().unwrap_or(default)
    }

    /// The `i`-th boolean argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error if there are fewer than `i + 1` booleans.
    pub fn bool(&self, i: usize) -> BridgeResult<bool> {
        self.bools
            .get(i)
            .copied()
            .ok_or_else(|| self.missing("boolean", i))
    }

    /// The `i`-th boolean argument, or `default`.
    #[must_use]
    pub fn bool_or(&self, i: usize, default: bool) -> bool {
        self.bools.get(i).copied().unwrap_or(default)
    }

    /// The `i`-th buffer argument.
    ///
    /// # Errors
    ///
    /// Returns an argument error if there are fewer than `i + 1` buffers.
    pub fn buffer(&self, i: usize) -> BridgeResult<&[u8]> {
        self.buffers
            .get(i)
            .map(Vec::as_slice)
            .ok_or_else(|| self.missing("ArrayBuffer", i))
    }

    /// Argument at position `i`, as passed.
    #[must_use]
    pub fn positional(&self, i: usize) -> Option<&ArgValue> {
        self.positional.get(i)
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    /// Strings of the array at position `i`.
    ///
    /// A missing or absent argument yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the argument is not an array of strings.
    pub fn strings_at(&self, i: usize) -> BridgeResult<Vec<String>> {
        match self.positional.get(i) {
            None | Some(ArgValue::Absent) => Ok(Vec::new()),
            Some(ArgValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    ArgValue::String(s) => Ok(s.clone()),
                    _ => Err(BridgeError::argument(
                        &self.method,
                        format!("argument {i} must be an array of strings"),
                    )),
                })
                .collect(),
            Some(_) => Err(BridgeError::argument(
                &self.method,
                format!("argument {i} must be an array"),
            )),
        }
    }

    fn missing(&self, kind: &str, i: usize) -> BridgeError {
        BridgeError::argument(
            &self.method,
            format!("missing {kind} argument #{}", i.saturating_add(1)),
        )
    }
}
