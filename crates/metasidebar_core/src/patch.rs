//! JSON-patch-like field mutations applied to instance data.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
    Test,
}

/// One field-level mutation instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOp {
    pub fn add(key: &str, value: Value) -> Self {
        Self::with_value(PatchOpKind::Add, key, value)
    }

    pub fn replace(key: &str, value: Value) -> Self {
        Self::with_value(PatchOpKind::Replace, key, value)
    }

    pub fn test(key: &str, value: Value) -> Self {
        Self::with_value(PatchOpKind::Test, key, value)
    }

    pub fn remove(key: &str) -> Self {
        Self {
            op: PatchOpKind::Remove,
            path: pointer_for(key),
            value: None,
        }
    }

    fn with_value(op: PatchOpKind, key: &str, value: Value) -> Self {
        Self {
            op,
            path: pointer_for(key),
            value: Some(value),
        }
    }
}

fn pointer_for(key: &str) -> String {
    format!("/{}", key.replace('~', "~0").replace('/', "~1"))
}

/// Resolve a single-segment pointer (`/<key>`) to its field key.
///
/// # Errors
/// Returns [`ApiError::PatchFailed`] for nested or empty paths and for
/// reserved `$`-prefixed keys.
pub fn field_key(path: &str) -> Result<String, ApiError> {
    let raw = path
        .strip_prefix('/')
        .ok_or_else(|| ApiError::PatchFailed(format!("path '{}' must start with '/'", path)))?;
    if raw.is_empty() || raw.contains('/') {
        return Err(ApiError::PatchFailed(format!(
            "path '{}' must address a single field",
            path
        )));
    }
    let key = raw.replace("~1", "/").replace("~0", "~");
    if key.starts_with('$') {
        return Err(ApiError::PatchFailed(format!(
            "field '{}' is reserved",
            key
        )));
    }
    Ok(key)
}

/// Apply `ops` in order to a copy of `data`.
///
/// The patch is all-or-nothing: on any failure the original data is left
/// untouched and the error names the failing operation.
///
/// # Returns
/// The patched data object.
///
/// # Errors
/// Returns [`ApiError::PatchFailed`] when a path is invalid, a `replace` or
/// `remove` targets a missing key, a value is missing, or a `test` fails.
pub fn apply_patch(data: &Map<String, Value>, ops: &[PatchOp]) -> Result<Map<String, Value>, ApiError> {
    let mut next = data.clone();
    for (index, op) in ops.iter().enumerate() {
        let key = field_key(&op.path)?;
        match op.op {
            PatchOpKind::Add => {
                next.insert(key, required_value(op, index)?);
            }
            PatchOpKind::Replace => {
                let value = required_value(op, index)?;
                match next.get_mut(&key) {
                    Some(slot) => *slot = value,
                    None => return Err(missing_key(index, &key)),
                }
            }
            PatchOpKind::Remove => {
                if next.remove(&key).is_none() {
                    return Err(missing_key(index, &key));
                }
            }
            PatchOpKind::Test => {
                let expected = required_value(op, index)?;
                if next.get(&key) != Some(&expected) {
                    return Err(ApiError::PatchFailed(format!(
                        "op {}: test failed for field '{}'",
                        index, key
                    )));
                }
            }
        }
    }
    Ok(next)
}

fn required_value(op: &PatchOp, index: usize) -> Result<Value, ApiError> {
    op.value
        .clone()
        .ok_or_else(|| ApiError::PatchFailed(format!("op {}: missing value", index)))
}

fn missing_key(index: usize, key: &str) -> ApiError {
    ApiError::PatchFailed(format!("op {}: field '{}' does not exist", index, key))
}
