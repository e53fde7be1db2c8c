//! Stock combiners for merges, forest flattening and combining fetches.
//!
//! A combiner receives the colliding path, the value accumulated so far (lower
//! priority) and the incoming value (higher priority), and returns the result.

use toml::Value;

use crate::domain::path::Path;

/// Incoming value wins outright.
pub fn replace(_path: &Path, _lhs: Value, rhs: Value) -> Value {
    rhs
}

/// Arrays on both sides are concatenated, lower priority first; otherwise
/// the incoming value wins.
pub fn concat_arrays(_path: &Path, lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Array(mut base), Value::Array(overlay)) => {
            base.extend(overlay);
            Value::Array(base)
        }
        (_, rhs) => rhs,
    }
}

/// Union of two arrays with negation support.
///
/// - Items from the overlay are added to the base unless already present
/// - A string item `"!x"` removes `"x"` from the result
/// - Order is first-seen, base before overlay
///
/// Anything other than two arrays is replaced by the incoming value.
pub fn union_arrays(_path: &Path, lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Array(base), Value::Array(overlay)) => {
            let mut result: Vec<Value> = Vec::with_capacity(base.len() + overlay.len());
            for item in base {
                if !result.contains(&item) {
                    result.push(item);
                }
            }
            for item in overlay {
                let negated = item
                    .as_str()
                    .and_then(|s| s.strip_prefix('!'))
                    .map(str::to_string);
                match negated {
                    Some(negated) => result.retain(|kept| kept.as_str() != Some(negated.as_str())),
                    None if !result.contains(&item) => result.push(item),
                    None => {}
                }
            }
            Value::Array(result)
        }
        (_, rhs) => rhs,
    }
}
