//! Conversions from host numbers and optional positional arguments.

use hostio_core::{ArgValue, AsyncArgs, BridgeError, BridgeResult};

/// Truncate a host number to an integer code. NaN maps to 0.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn code(n: f64) -> i64 {
    if n.is_nan() { 0 } else { n.trunc() as i64 }
}

/// Interpret a host number as a handle id. A non-integer is an argument
/// error; an integer outside `0..=u32::MAX` is a range error.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn handle_id(method: &str, n: f64) -> BridgeResult<u32> {
    if n.fract() != 0.0 || n.is_nan() {
        return Err(BridgeError::argument(
            method,
            format!("handle must be an integer, got {n}"),
        ));
    }
    if (0.0..=f64::from(u32::MAX)).contains(&n) {
        Ok(n as u32)
    } else {
        Err(BridgeError::range(method, format!("handle {n} is out of range")))
    }
}

/// Interpret a host number as an optional byte count; negative means none.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn byte_count(n: Option<f64>) -> Option<u64> {
    n.filter(|v| *v >= 0.0).map(|v| v as u64)
}

/// Required string at position `i`.
pub(crate) fn required_str(args: &AsyncArgs, i: usize) -> BridgeResult<&str> {
    match args.positional(i) {
        Some(ArgValue::String(s)) => Ok(s),
        _ => Err(BridgeError::argument(
            args.method(),
            format!("argument {i} must be a string"),
        )),
    }
}

/// String at position `i`, or `None` when missing or absent.
pub(crate) fn optional_str(args: &AsyncArgs, i: usize) -> BridgeResult<Option<&str>> {
    match args.positional(i) {
        None | Some(ArgValue::Absent) => Ok(None),
        Some(ArgValue::String(s)) => Ok(Some(s)),
        Some(_) => Err(BridgeError::argument(
            args.method(),
            format!("argument {i} must be a string"),
        )),
    }
}

/// Number at position `i`, or `None` when missing or absent.
pub(crate) fn optional_number(args: &AsyncArgs, i: usize) -> BridgeResult<Option<f64>> {
    match args.positional(i) {
        None | Some(ArgValue::Absent) => Ok(None),
        Some(ArgValue::Number(n)) => Ok(Some(*n)),
        Some(_) => Err(BridgeError::argument(
            args.method(),
            format!("argument {i} must be a number"),
        )),
    }
}

/// Boolean at position `i`, or `None` when missing or absent.
pub(crate) fn optional_bool(args: &AsyncArgs, i: usize) -> BridgeResult<Option<bool>> {
    match args.positional(i) {
        None | Some(ArgValue::Absent) => Ok(None),
        Some(ArgValue::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(BridgeError::argument(
            args.method(),
            format!("argument {i} must be a boolean"),
        )),
    }
}

/// A positive timeout in milliseconds at position `i`, else `default`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn timeout_ms(args: &AsyncArgs, i: usize, default: u64) -> BridgeResult<u64> {
    Ok(optional_number(args, i)?
        .filter(|ms| *ms >= 1.0)
        .map_or(default, |ms| ms as u64))
}

/// Pair up a flat `[k1, v1, k2, v2, ...]` array at position `i`.
pub(crate) fn flat_pairs(args: &AsyncArgs, i: usize) -> BridgeResult<Vec<(String, String)>> {
    let flat = args.strings_at(i)?;
    if flat.len() % 2 != 0 {
        return Err(BridgeError::argument(
            args.method(),
            format!("argument {i} must hold key/value pairs, got {} strings", flat.len()),
        ));
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut items = flat.into_iter();
    while let (Some(k), Some(v)) = (items.next(), items.next()) {
        pairs.push((k, v));
    }
    Ok(pairs)
}
