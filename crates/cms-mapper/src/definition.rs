//! Type-erased constructor and mutator roles.
//!
//! A definition for a `(S, T)` pair is a [`Construct`] that allocates a new `T`
//! from an `S`, and a [`Mutate`] that copies fields from an `S` into an existing
//! `T`. Both operate on erased values so the dispatch tables can hold every
//! pair side by side.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::MapperContext;
use crate::error::MapError;
use crate::types::{downcast_mut, downcast_ref};

/// Allocates a target value from a source value.
pub trait Construct: Send + Sync {
    /// Builds the target.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] when the target cannot be built, including
    /// [`MapError::NoConstructor`] for pairs registered without a constructor.
    fn construct(
        &self,
        source: &dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<Box<dyn Any>, MapError>;
}

/// Copies or transforms fields from a source into an allocated target.
pub trait Mutate: Send + Sync {
    /// Updates `target` from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the mutation or a nested mapping fails.
    fn mutate(
        &self,
        source: &dyn Any,
        target: &mut dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<(), MapError>;
}

pub(crate) type ConstructorRef = Arc<dyn Construct>;
pub(crate) type MutatorRef = Arc<dyn Mutate>;

/// Constructor backed by a typed closure.
pub(crate) struct FnConstructor<S, T, F> {
    f: F,
    _types: PhantomData<fn(&S) -> T>,
}

impl<S, T, F> FnConstructor<S, T, F>
where
    F: Fn(&S, &mut MapperContext<'_>) -> Result<T, MapError> + Send + Sync,
{
    pub(crate) fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

impl<S, T, F> Construct for FnConstructor<S, T, F>
where
    S: Any,
    T: Any,
    F: Fn(&S, &mut MapperContext<'_>) -> Result<T, MapError> + Send + Sync,
{
    fn construct(
        &self,
        source: &dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        let source = downcast_ref::<S>(source)?;
        let target = (self.f)(source, ctx)?;
        Ok(Box::new(target))
    }
}

/// Mutator backed by a typed closure.
pub(crate) struct FnMutator<S, T, F> {
    f: F,
    _types: PhantomData<fn(&S, &mut T)>,
}

impl<S, T, F> FnMutator<S, T, F>
where
    F: Fn(&S, &mut T, &mut MapperContext<'_>) -> Result<(), MapError> + Send + Sync,
{
    pub(crate) fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

impl<S, T, F> Mutate for FnMutator<S, T, F>
where
    S: Any,
    T: Any,
    F: Fn(&S, &mut T, &mut MapperContext<'_>) -> Result<(), MapError> + Send + Sync,
{
    fn mutate(
        &self,
        source: &dyn Any,
        target: &mut dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<(), MapError> {
        let source = downcast_ref::<S>(source)?;
        let target = downcast_mut::<T>(target)?;
        (self.f)(source, target, ctx)
    }
}

/// Stand-in constructor for pairs whose targets are always supplied by the caller.
pub(crate) struct MissingConstructor {
    pub(crate) target: &'static str,
}

impl Construct for MissingConstructor {
    fn construct(
        &self,
        _source: &dyn Any,
        _ctx: &mut MapperContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        Err(MapError::NoConstructor {
            target: self.target.to_string(),
        })
    }
}

/// Mutator for pairs whose constructor already yields a complete target.
pub(crate) struct NoopMutator;

impl Mutate for NoopMutator {
    fn mutate(
        &self,
        _source: &dyn Any,
        _target: &mut dyn Any,
        _ctx: &mut MapperContext<'_>,
    ) -> Result<(), MapError> {
        Ok(())
    }
}
