//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific control plane.
//! It is responsible for converting Effects into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Broad classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or (de)serialization failure talking to the API
    Transport,
    /// The remote object does not exist
    NotFound,
    /// An asynchronous task reached a failure status
    TaskFailed,
    /// An asynchronous task did not finish in time; it may still be running
    Timeout,
    /// Declared configuration was rejected before any remote call
    Validation,
    /// The API answered with an error status
    Api,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub kind: ErrorKind,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Api,
            resource_id: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Validation)
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Main Provider trait
///
/// All operations are async and involve side effects. Each operation runs
/// to completion (including waiting for remote tasks) before returning.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "yba")
    fn name(&self) -> &'static str;

    /// Schemas of the resource types and data sources this Provider handles
    fn schemas(&self) -> Vec<ResourceSchema>;

    /// Get the current state of a managed resource
    ///
    /// `prior` is the last recorded state, which carries the remote
    /// identifier and parent identifiers. Returns `State::not_found()`
    /// if the resource no longer exists.
    fn read(&self, id: &ResourceId, prior: &State) -> BoxFuture<'_, ProviderResult<State>>;

    /// Read a data source
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote UUID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn schemas(&self) -> Vec<ResourceSchema> {
        (**self).schemas()
    }

    fn read(&self, id: &ResourceId, prior: &State) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, prior)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, from, to)
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn schemas(&self) -> Vec<ResourceSchema> {
            vec![]
        }

        fn read(&self, id: &ResourceId, _prior: &State) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let state = State::existing(resource.id.clone(), resource.attributes.clone());
            Box::pin(async move { Ok(state) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("mock-id-123")) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(&self, _state: &State) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let id = ResourceId::new("test", "example");
        let prior = State::not_found(id.clone());
        let state = provider.read(&id, &prior).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn boxed_provider_dispatches() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let resource = Resource::new("test", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
    }

    #[test]
    fn error_display_includes_resource() {
        let err = ProviderError::validation("bad field")
            .for_resource(ResourceId::new("yba_user", "admin"));
        assert_eq!(err.to_string(), "[yba_user.admin] bad field");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.is_not_found());
    }
}
