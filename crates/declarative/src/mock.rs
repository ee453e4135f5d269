//! In-memory [`RemoteApi`] for testing without network access.
//!
//! ```
//! use declarative::mock::MockApi;
//! use declarative::{GetQuery, RemoteApi, RemoteEntity};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Note { id: Option<String>, text: String }
//!
//! impl RemoteEntity for Note {
//!     fn remote_id(&self) -> Option<&str> { self.id.as_deref() }
//!     fn set_remote_id(&mut self, id: &str) { self.id = Some(id.to_string()); }
//! }
//!
//! let api = MockApi::new();
//! let ids = api.create(&[Note { id: None, text: "hi".into() }]).unwrap();
//! let found = api.get(&GetQuery::by_id(&ids[0])).unwrap();
//! assert_eq!(found[0].text, "hi");
//! ```

use crate::client::{GetQuery, RemoteApi, RemoteEntity};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Error returned by [`MockApi`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockError {
    /// Injected rejection
    #[error("{0}")]
    Rejected(String),
    /// Update or delete of an identifier that does not exist
    #[error("no permissions to referred object or it does not exist: {0}")]
    UnknownId(String),
}

/// A recorded call, for asserting what the reconciler sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Create { count: usize },
    Get(GetQuery),
    Update { ids: Vec<String> },
    Delete { ids: Vec<String> },
}

type Normalizer<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

struct MockState<E> {
    entities: BTreeMap<String, E>,
    next_id: u64,
    calls: Vec<MockCall>,
    reject_next: Option<String>,
    duplicated: HashSet<String>,
}

/// In-memory remote API.
///
/// Identifiers are assigned sequentially starting at `first_id`. An optional
/// normalizer runs on every stored entity to imitate server-side defaulting.
#[derive(Clone)]
pub struct MockApi<E> {
    state: Arc<Mutex<MockState<E>>>,
    normalizer: Option<Normalizer<E>>,
}

impl<E> std::fmt::Debug for MockApi<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("MockApi")
            .field("entities", &state.entities.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

impl<E: RemoteEntity> Default for MockApi<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RemoteEntity> MockApi<E> {
    /// Create an empty mock; identifiers start at 1000
    pub fn new() -> Self {
        Self::with_first_id(1000)
    }

    pub fn with_first_id(first_id: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                entities: BTreeMap::new(),
                next_id: first_id,
                calls: Vec::new(),
                reject_next: None,
                duplicated: HashSet::new(),
            })),
            normalizer: None,
        }
    }

    /// Run `f` on every entity the mock stores
    pub fn with_normalizer(mut self, f: impl Fn(&mut E) + Send + Sync + 'static) -> Self {
        self.normalizer = Some(Arc::new(f));
        self
    }

    /// Store an entity directly, as if it had been created out-of-band
    pub fn insert(&self, mut entity: E) -> String {
        let mut state = self.state.lock().unwrap();
        let id = match entity.remote_id() {
            Some(id) => id.to_string(),
            None => {
                let id = state.next_id.to_string();
                state.next_id += 1;
                entity.set_remote_id(&id);
                id
            }
        };
        state.entities.insert(id.clone(), entity);
        id
    }

    /// Remove an entity out-of-band
    pub fn remove(&self, id: &str) -> Option<E> {
        self.state.lock().unwrap().entities.remove(id)
    }

    /// Current stored copy of an entity
    pub fn entity(&self, id: &str) -> Option<E> {
        self.state.lock().unwrap().entities.get(id).cloned()
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject the next write (create, update or delete) with `message`
    pub fn reject_next(&self, message: impl Into<String>) {
        self.state.lock().unwrap().reject_next = Some(message.into());
    }

    /// Return the entity twice from `get`, as a broken backend would
    pub fn duplicate(&self, id: &str) {
        self.state.lock().unwrap().duplicated.insert(id.to_string());
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn take_rejection(state: &mut MockState<E>) -> Result<(), MockError> {
        match state.reject_next.take() {
            Some(message) => Err(MockError::Rejected(message)),
            None => Ok(()),
        }
    }

    fn normalize(&self, entity: &mut E) {
        if let Some(f) = &self.normalizer {
            f(entity);
        }
    }
}

impl<E: RemoteEntity> RemoteApi for MockApi<E> {
    type Entity = E;
    type Error = MockError;

    fn create(&self, batch: &[E]) -> Result<Vec<String>, MockError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Create { count: batch.len() });
        Self::take_rejection(&mut state)?;

        let mut ids = Vec::with_capacity(batch.len());
        for entity in batch {
            let id = state.next_id.to_string();
            state.next_id += 1;
            let mut stored = entity.clone();
            stored.set_remote_id(&id);
            self.normalize(&mut stored);
            state.entities.insert(id.clone(), stored);
            ids.push(id);
        }
        Ok(ids)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<E>, MockError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Get(query.clone()));

        let mut found = Vec::new();
        for id in &query.ids {
            if let Some(entity) = state.entities.get(id) {
                found.push(entity.clone());
                if state.duplicated.contains(id) {
                    found.push(entity.clone());
                }
            }
        }
        Ok(found)
    }

    fn update(&self, batch: &[E]) -> Result<Vec<String>, MockError> {
        let mut state = self.state.lock().unwrap();
        let ids: Vec<String> = batch
            .iter()
            .map(|e| e.remote_id().unwrap_or_default().to_string())
            .collect();
        state.calls.push(MockCall::Update { ids: ids.clone() });
        Self::take_rejection(&mut state)?;

        if let Some(missing) = ids.iter().find(|id| !state.entities.contains_key(*id)) {
            return Err(MockError::UnknownId(missing.clone()));
        }
        for (id, entity) in ids.iter().zip(batch) {
            let mut stored = entity.clone();
            self.normalize(&mut stored);
            state.entities.insert(id.clone(), stored);
        }
        Ok(ids)
    }

    fn delete(&self, ids: &[String]) -> Result<Vec<String>, MockError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Delete { ids: ids.to_vec() });
        Self::take_rejection(&mut state)?;

        if let Some(missing) = ids.iter().find(|id| !state.entities.contains_key(*id)) {
            return Err(MockError::UnknownId(missing.clone()));
        }
        for id in ids {
            state.entities.remove(id);
        }
        Ok(ids.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Option<String>,
        text: String,
    }

    impl RemoteEntity for Note {
        fn remote_id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_remote_id(&mut self, id: &str) {
            self.id = Some(id.to_string());
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let api = MockApi::with_first_id(7);
        let ids = api.create(&[note("a"), note("b")]).unwrap();
        assert_eq!(ids, vec!["7", "8"]);
        assert_eq!(api.entity("8").unwrap().text, "b");
    }

    #[test]
    fn test_reject_next_is_one_shot() {
        let api = MockApi::new();
        api.reject_next("boom");
        assert_eq!(
            api.create(&[note("a")]).unwrap_err(),
            MockError::Rejected("boom".into())
        );
        assert!(api.is_empty());
        assert!(api.create(&[note("a")]).is_ok());
    }

    #[test]
    fn test_update_unknown_id() {
        let api: MockApi<Note> = MockApi::new();
        let mut n = note("x");
        n.set_remote_id("42");
        assert_eq!(
            api.update(&[n]).unwrap_err(),
            MockError::UnknownId("42".into())
        );
    }

    #[test]
    fn test_update_replaces_entity() {
        let api = MockApi::new();
        let id = api.insert(note("old"));
        let mut n = note("new");
        n.set_remote_id(&id);
        api.update(&[n]).unwrap();
        assert_eq!(api.entity(&id).unwrap().text, "new");
    }

    #[test]
    fn test_duplicate_and_remove() {
        let api = MockApi::new();
        let id = api.insert(note("x"));
        api.duplicate(&id);
        assert_eq!(api.get(&GetQuery::by_id(&id)).unwrap().len(), 2);
        api.remove(&id);
        assert!(api.get(&GetQuery::by_id(&id)).unwrap().is_empty());
    }

    #[test]
    fn test_normalizer_runs_on_store() {
        let api = MockApi::new().with_normalizer(|n: &mut Note| n.text = n.text.to_uppercase());
        let ids = api.create(&[note("quiet")]).unwrap();
        assert_eq!(api.entity(&ids[0]).unwrap().text, "QUIET");
    }

    #[test]
    fn test_calls_are_recorded() {
        let api = MockApi::new();
        let ids = api.create(&[note("a")]).unwrap();
        api.get(&GetQuery::by_id(&ids[0])).unwrap();
        api.delete(&ids).unwrap();
        assert_eq!(
            api.calls(),
            vec![
                MockCall::Create { count: 1 },
                MockCall::Get(GetQuery::by_id(&ids[0])),
                MockCall::Delete { ids: ids.clone() },
            ]
        );
    }
}
