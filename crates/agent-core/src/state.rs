//! Write-once state store shared by the agents of one pipeline run
//!
//! The store is an arena of immutable documents indexed by output key. Every
//! key the pipeline can produce is declared up-front as an empty slot; a slot
//! is filled at most once. Writes are whole-document, so a reader only ever
//! observes a slot as absent or as the complete document.

use crate::context::{Context, Slot};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Per-run keyed document store with write-once slots
///
/// # Example
///
/// ```
/// use agent_core::StateStore;
/// use serde_json::json;
///
/// let store = StateStore::with_keys(["news_data", "trend_analysis"]);
/// store.write("news_data", json!({"summary": "quiet day"})).unwrap();
///
/// assert!(store.read("news_data").is_some());
/// assert!(store.read("trend_analysis").is_none());
/// assert!(store.write("news_data", json!({})).is_err());
/// ```
#[derive(Debug, Default)]
pub struct StateStore {
    slots: BTreeMap<String, OnceLock<Arc<Value>>>,
}

impl StateStore {
    /// Create a store with one empty slot per declared key
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: keys
                .into_iter()
                .map(|k| (k.into(), OnceLock::new()))
                .collect(),
        }
    }

    /// Write a complete document into its slot
    ///
    /// Fails with [`Error::UnknownKey`] if the key was never declared and with
    /// [`Error::DuplicateKey`] if the slot is already filled. The existing
    /// document is never overwritten.
    pub fn write(&self, key: &str, value: Value) -> Result<()> {
        let slot = self
            .slots
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;

        slot.set(Arc::new(value))
            .map_err(|_| Error::DuplicateKey(key.to_string()))?;

        debug!(key = %key, "State key written");
        Ok(())
    }

    /// Read a document; `None` means the key has not been written (yet)
    pub fn read(&self, key: &str) -> Option<Arc<Value>> {
        self.slots.get(key).and_then(|slot| slot.get()).cloned()
    }

    /// Whether the key has been written
    pub fn contains(&self, key: &str) -> bool {
        self.read(key).is_some()
    }

    /// Whether the key is declared (written or not)
    pub fn is_declared(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Copy of every written document, keyed by output key
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.slots
            .iter()
            .filter_map(|(k, slot)| slot.get().map(|v| (k.clone(), v.as_ref().clone())))
            .collect()
    }

    /// All declared keys
    pub fn declared_keys(&self) -> BTreeSet<String> {
        self.slots.keys().cloned().collect()
    }

    /// Keys that currently hold a document
    pub fn written_keys(&self) -> BTreeSet<String> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Declared keys that are still empty
    pub fn unwritten_keys(&self) -> BTreeSet<String> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.get().is_none())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Number of written keys
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.get().is_some()).count()
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build an invocation context exposing exactly `keys`
    ///
    /// Keys without a document are included as [`Slot::Absent`] rather than
    /// omitted.
    pub fn context_for<'a, I>(&self, query: &str, keys: I) -> Context
    where
        I: IntoIterator<Item = &'a str>,
    {
        let inputs = keys
            .into_iter()
            .map(|k| {
                let slot = self.read(k).map_or(Slot::Absent, Slot::Present);
                (k.to_string(), slot)
            })
            .collect();
        Context::new(query, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_then_read() {
        let store = StateStore::with_keys(["k1", "k2"]);
        assert!(store.is_empty());

        store.write("k1", json!({"v": 1})).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(*store.read("k1").unwrap(), json!({"v": 1}));
        assert!(store.read("k2").is_none());
    }

    #[test]
    fn test_second_write_is_rejected_and_keeps_first_value() {
        let store = StateStore::with_keys(["k1"]);
        store.write("k1", json!("first")).unwrap();

        let err = store.write("k1", json!("second")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(ref k) if k == "k1"));
        assert_eq!(*store.read("k1").unwrap(), json!("first"));
    }

    #[test]
    fn test_undeclared_key_is_rejected() {
        let store = StateStore::with_keys(["k1"]);
        let err = store.write("other", json!(null)).unwrap_err();
        assert!(matches!(err, Error::UnknownKey(_)));
        assert!(!store.is_declared("other"));
    }

    #[test]
    fn test_written_and_unwritten_keys() {
        let store = StateStore::with_keys(["a", "b", "c"]);
        store.write("b", json!(2)).unwrap();

        assert_eq!(
            store.written_keys().into_iter().collect::<Vec<_>>(),
            vec!["b".to_string()]
        );
        assert_eq!(
            store.unwritten_keys().into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "c".to_string()]
        );
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_context_marks_absent_keys() {
        let store = StateStore::with_keys(["k1", "k2"]);
        store.write("k2", json!({"ok": true})).unwrap();

        let ctx = store.context_for("query", ["k1", "k2"]);
        assert!(ctx.is_absent("k1"));
        assert!(!ctx.is_absent("k2"));
        assert_eq!(ctx.keys().count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_distinct_keys() {
        let store = Arc::new(StateStore::with_keys(["a", "b", "c", "d"]));
        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|key| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.write(key, json!(key)) })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 4);
        assert!(store.unwritten_keys().is_empty());
    }
}
