//! Remote API seam
//!
//! The reconciler never talks HTTP itself. It calls a [`RemoteApi`], which
//! owns transport, authentication, retries and connection reuse.

/// An API record that carries a remote-assigned identifier
pub trait RemoteEntity: Clone + std::fmt::Debug + Send + Sync {
    /// Identifier assigned by the remote system, if any
    fn remote_id(&self) -> Option<&str>;

    /// Attach an identifier (used for updates)
    fn set_remote_id(&mut self, id: &str);
}

/// Filter parameters for [`RemoteApi::get`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetQuery {
    /// Identifiers to fetch
    pub ids: Vec<String>,
    /// Return sub-resources (e.g. preprocessing steps) inline
    pub expand_sub_resources: bool,
}

impl GetQuery {
    /// Query a single identifier with sub-resources expanded
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
            expand_sub_resources: true,
        }
    }
}

/// Batch CRUD operations exposed by a remote API client.
///
/// Each call is a blocking request/response. Errors cover both transport
/// and application-level failures.
pub trait RemoteApi: Send + Sync {
    type Entity: RemoteEntity;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create every entity in the batch, returning the assigned identifiers in order
    fn create(&self, batch: &[Self::Entity]) -> Result<Vec<String>, Self::Error>;

    /// Fetch entities matching the query
    fn get(&self, query: &GetQuery) -> Result<Vec<Self::Entity>, Self::Error>;

    /// Update every entity in the batch (identifiers must be set)
    fn update(&self, batch: &[Self::Entity]) -> Result<Vec<String>, Self::Error>;

    /// Delete the given identifiers
    fn delete(&self, ids: &[String]) -> Result<Vec<String>, Self::Error>;
}

impl<A: RemoteApi + ?Sized> RemoteApi for &A {
    type Entity = A::Entity;
    type Error = A::Error;

    fn create(&self, batch: &[Self::Entity]) -> Result<Vec<String>, Self::Error> {
        (**self).create(batch)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Self::Entity>, Self::Error> {
        (**self).get(query)
    }

    fn update(&self, batch: &[Self::Entity]) -> Result<Vec<String>, Self::Error> {
        (**self).update(batch)
    }

    fn delete(&self, ids: &[String]) -> Result<Vec<String>, Self::Error> {
        (**self).delete(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_by_id_expands() {
        let query = GetQuery::by_id("100");
        assert_eq!(query.ids, vec!["100".to_string()]);
        assert!(query.expand_sub_resources);
    }
}
