use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::Version;

/// The persisted representation of one aggregate instance.
///
/// The whole aggregate graph (root plus internal entities) lives in `state`,
/// so a record is written or rejected as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// The type of aggregate (e.g., "Order", "StockItem").
    pub aggregate_type: String,

    /// The aggregate identity rendered as a string key.
    pub aggregate_key: String,

    /// The version assigned by the store on the last successful save.
    pub version: Version,

    /// When the record was last written.
    pub saved_at: DateTime<Utc>,

    /// The serialized aggregate state.
    pub state: serde_json::Value,
}

impl AggregateRecord {
    /// Creates a record from an already serialized state.
    ///
    /// The version is assigned by the store when the record is saved.
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_key: impl Into<String>,
        state: serde_json::Value,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_key: aggregate_key.into(),
            version: Version::initial(),
            saved_at: Utc::now(),
            state,
        }
    }

    /// Creates a record by serializing `state`.
    pub fn from_state<T: Serialize>(
        aggregate_type: impl Into<String>,
        aggregate_key: impl Into<String>,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            aggregate_type,
            aggregate_key,
            serde_json::to_value(state)?,
        ))
    }

    /// Deserializes the stored state.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: i32,
    }

    #[test]
    fn record_from_state_starts_unversioned() {
        let record = AggregateRecord::from_state("Counter", "c-1", &Counter { value: 3 }).unwrap();
        assert_eq!(record.aggregate_type, "Counter");
        assert_eq!(record.aggregate_key, "c-1");
        assert_eq!(record.version, Version::initial());
        assert_eq!(record.state, serde_json::json!({ "value": 3 }));
    }

    #[test]
    fn record_state_deserializes_back() {
        let record = AggregateRecord::from_state("Counter", "c-1", &Counter { value: 9 }).unwrap();
        let counter: Counter = record.state_as().unwrap();
        assert_eq!(counter, Counter { value: 9 });
    }
}
