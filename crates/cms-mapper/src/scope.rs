//! Unit-of-work coordination.
//!
//! Mutators frequently touch lazily loaded data. Wrapping each mutation (and
//! each whole collection loop) in one scope makes those loads share a single
//! logical transaction instead of opening one per property access.
//!
//! Nesting is the provider's concern: the engine requests a scope even when one
//! is already active further up the call chain.

use std::sync::Arc;

use crate::error::MapError;

/// A unit-of-work boundary.
///
/// Dropping the scope releases it. A scope dropped without [`Scope::complete`]
/// having been called must not commit.
pub trait Scope {
    /// Marks the unit of work as successful.
    fn complete(&mut self);
}

/// Source of unit-of-work scopes, supplied by the persistence layer.
pub trait ScopeProvider: Send + Sync {
    /// Opens a scope.
    ///
    /// With `auto_complete`, the acquirer completes the scope itself as soon as
    /// the wrapped block succeeds, so the provider must not wait for an outer
    /// owner to do it.
    fn create_scope(&self, auto_complete: bool) -> Box<dyn Scope + '_>;
}

/// Provider for hosts without a unit of work.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScopeProvider;

struct NullScope;

impl Scope for NullScope {
    fn complete(&mut self) {}
}

impl ScopeProvider for NullScopeProvider {
    fn create_scope(&self, _auto_complete: bool) -> Box<dyn Scope + '_> {
        Box::new(NullScope)
    }
}

/// Runs blocks of mapping work inside auto-completing scopes.
#[derive(Clone)]
pub(crate) struct ScopeCoordinator {
    provider: Arc<dyn ScopeProvider>,
}

impl ScopeCoordinator {
    pub(crate) fn new(provider: Arc<dyn ScopeProvider>) -> Self {
        Self { provider }
    }

    /// Run `work` in one scope; the scope completes only if `work` returns `Ok`.
    ///
    /// A panic unwinds through the guard, which drops the scope uncompleted.
    pub(crate) fn run<R>(
        &self,
        work: impl FnOnce() -> Result<R, MapError>,
    ) -> Result<R, MapError> {
        let mut scope = self.provider.create_scope(true);
        let outcome = work();
        if outcome.is_ok() {
            scope.complete();
        }
        outcome
    }
}
