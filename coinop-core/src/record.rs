//! Key-value records of training metrics.
use crate::error::CoinopError;
use anyhow::Result;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar, e.g., reward or loss of a step.
    Scalar(f32),

    /// A timestamp.
    DateTime(DateTime<Local>),

    /// A text value.
    String(String),
}

/// A set of named values produced during training or evaluation.
///
/// Callbacks receive one record per step and per episode; the keys present
/// depend on the event (see [`Trainer`](crate::Trainer)).
#[derive(Debug, Clone)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record with a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns the value for the given key, if present.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns `true` if the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges the given record into this one, consuming both.
    pub fn merge(self, record: Record) -> Self {
        Self(self.0.into_iter().chain(record.0).collect())
    }

    /// Returns the scalar value for the given key.
    ///
    /// Fails with [`CoinopError::RecordValueType`] if the key is missing or
    /// holds a non-scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            _ => Err(CoinopError::RecordValueType(k.into()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_get_scalar() {
        let r1 = Record::from_scalar("reward", 1.0);
        let mut r2 = Record::empty();
        r2.insert("loss", RecordValue::Scalar(0.5));
        r2.insert("phase", RecordValue::String("training".into()));

        let merged = r1.merge(r2);
        assert_eq!(merged.get_scalar("reward").unwrap(), 1.0);
        assert_eq!(merged.get_scalar("loss").unwrap(), 0.5);
        assert!(merged.get_scalar("phase").is_err());
        assert!(merged.get_scalar("missing").is_err());

        let mut keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["loss", "phase", "reward"]);
        assert_eq!(merged.iter().count(), 3);
    }

    #[test]
    fn from_slice_collects_all_pairs() {
        let record = Record::from_slice(&[
            ("reward", RecordValue::Scalar(2.0)),
            ("datetime", RecordValue::DateTime(chrono::Local::now())),
        ]);
        assert_eq!(record.get_scalar("reward").unwrap(), 2.0);
        assert!(matches!(
            record.get("datetime"),
            Some(RecordValue::DateTime(_))
        ));
    }
}
