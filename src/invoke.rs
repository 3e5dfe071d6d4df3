//! Invocation seam: how the generator reads live property values.

use std::collections::HashMap;

use crate::error::GenerateError;
use crate::value::NativeValue;

/// A live native object that can answer accessor calls.
pub trait Receiver: Sync {
    fn call(&self, accessor: &str, arguments: &[NativeValue]) -> Option<NativeValue>;
}

/// Call `accessor` on `receiver`; a missing receiver yields no value.
pub fn invoke(
    receiver: Option<&dyn Receiver>,
    accessor: &str,
    arguments: &[NativeValue],
) -> Option<NativeValue> {
    receiver?.call(accessor, arguments)
}

/// Receiver backed by a captured accessor → value table.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReceiver {
    values: HashMap<String, NativeValue>,
}

impl SnapshotReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, accessor: impl Into<String>, value: NativeValue) -> Self {
        self.values.insert(accessor.into(), value);
        self
    }

    /// Build from a JSON object keyed by accessor name.
    pub fn from_value(json: serde_json::Value) -> Result<Self, GenerateError> {
        let values: HashMap<String, NativeValue> =
            serde_json::from_value(json).map_err(GenerateError::InvalidSnapshot)?;
        Ok(Self { values })
    }
}

impl Receiver for SnapshotReceiver {
    fn call(&self, accessor: &str, _arguments: &[NativeValue]) -> Option<NativeValue> {
        self.values.get(accessor).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_receiver_returns_nothing() {
        assert_eq!(invoke(None, "prefix", &[]), None);
    }

    #[test]
    fn test_snapshot_from_json() {
        let snapshot =
            SnapshotReceiver::from_value(serde_json::json!({ "prefix": "> ", "count": 3 }))
                .unwrap();
        assert_eq!(
            invoke(Some(&snapshot), "prefix", &[]),
            Some(NativeValue::String("> ".to_string()))
        );
        assert_eq!(snapshot.call("count", &[]), Some(NativeValue::Int(3)));
        assert_eq!(snapshot.call("missing", &[]), None);
    }

    #[test]
    fn test_snapshot_rejects_non_object() {
        assert!(matches!(
            SnapshotReceiver::from_value(serde_json::json!([1, 2])),
            Err(GenerateError::InvalidSnapshot(_))
        ));
    }
}
