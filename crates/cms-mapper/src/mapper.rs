//! The mapping orchestrator.
//!
//! [`Mapper`] ties the registry, the resolver, the collection synthesizer and
//! the scope coordinator together behind the public `map*` operations.
//!
//! # Dispatch
//!
//! The source type is always the *runtime* type of the value behind the
//! `&dyn Any`. When no definition exists for it, definitions of its declared
//! supertypes apply (see [`MapDefinitions::extends`]):
//!
//! - the closest ancestor wins (breadth-first over declared relations);
//! - ancestors at the same distance rank in declaration order;
//! - the winner is cached under the runtime type for the life of the mapper.
//!
//! If that fails too and both types are known collections, a collection
//! mapping is derived from the element mapping (unless disabled in
//! [`MapperOptions`]).
//!
//! # Variants
//!
//! Each operation comes in three flavours: a default context (`map`), a
//! context-preparation callback run once before anything is mapped
//! (`map_with`), and a caller-owned context (the same methods on
//! [`MapperContext`]).

use std::any::{Any, TypeId};
use std::sync::Arc;

use tracing::debug;

use crate::config::MapperOptions;
use crate::context::MapperContext;
use crate::definition::{ConstructorRef, MutatorRef};
use crate::dispatch::Resolver;
use crate::error::MapError;
use crate::registry::{MapDefinitions, Profile};
use crate::scope::{ScopeCoordinator, ScopeProvider};
use crate::shape::ShapeRegistry;
use crate::synth;
use crate::types::{TypeKey, TypeNames};

/// Object-to-object mapper.
///
/// Built once from the application's profiles and shared (it is `Send + Sync`)
/// by every caller for the life of the process.
pub struct Mapper {
    resolver: Resolver,
    shapes: ShapeRegistry,
    names: TypeNames,
    scopes: ScopeCoordinator,
    options: MapperOptions,
}

impl Mapper {
    /// Build a mapper from `profiles`, run in order, with default options.
    pub fn new(
        profiles: impl IntoIterator<Item = Box<dyn Profile>>,
        scope_provider: Arc<dyn ScopeProvider>,
    ) -> Self {
        Self::with_options(profiles, scope_provider, MapperOptions::default())
    }

    /// Build a mapper from `profiles`, run in order.
    pub fn with_options(
        profiles: impl IntoIterator<Item = Box<dyn Profile>>,
        scope_provider: Arc<dyn ScopeProvider>,
        options: MapperOptions,
    ) -> Self {
        let mut maps = MapDefinitions::default();
        let mut profile_count = 0usize;
        for profile in profiles {
            profile.define_maps(&mut maps);
            profile_count += 1;
        }
        let (pairs, relations) = (maps.len(), maps.relation_count());
        let (resolver, shapes, names) = maps.into_parts();
        debug!(
            profiles = profile_count,
            pairs,
            relations,
            shapes = shapes.len(),
            types = names.len(),
            "mapper built"
        );

        Self {
            resolver,
            shapes,
            names,
            scopes: ScopeCoordinator::new(scope_provider),
            options,
        }
    }

    /// Options the mapper was built with.
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// A fresh context for a caller that wants to own it.
    pub fn context(&self) -> MapperContext<'_> {
        MapperContext::new(self)
    }

    /// Whether `(S, T)` currently has an exact entry in both dispatch tables,
    /// whether registered, cached from an ancestor, or synthesized. Does not
    /// resolve anything.
    pub fn has_definition<S: Any, T: Any>(&self) -> bool {
        self.resolver.contains(TypeId::of::<S>(), TypeId::of::<T>())
    }

    // -------------------------------------------------------------------------
    // New targets
    // -------------------------------------------------------------------------

    /// Map `source` to a new `T`.
    ///
    /// # Errors
    ///
    /// - [`MapError::NoMapping`] if nothing maps the source's runtime type to `T`.
    /// - [`MapError::NoElementMapping`] if both are collections but their
    ///   elements cannot be mapped.
    /// - [`MapError::NoConstructor`] if the pair was defined without a
    ///   constructor.
    /// - Whatever the constructor or mutator raise.
    pub fn map<T: Any>(&self, source: &dyn Any) -> Result<T, MapError> {
        let mut ctx = self.context();
        self.map_in(source, &mut ctx)
    }

    /// [`Mapper::map`] with a context prepared by `prepare`.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_with<T: Any>(
        &self,
        source: &dyn Any,
        prepare: impl FnOnce(&mut MapperContext<'_>),
    ) -> Result<T, MapError> {
        let mut ctx = self.context();
        prepare(&mut ctx);
        self.map_in(source, &mut ctx)
    }

    /// Map an optional source. An absent source yields `Ok(None)` before any
    /// lookup, whether or not the pair is mappable.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_opt<T: Any>(&self, source: Option<&dyn Any>) -> Result<Option<T>, MapError> {
        self.context().map_opt(source)
    }

    /// [`Mapper::map_opt`] with a context prepared by `prepare`. `prepare` runs
    /// even when the source is absent.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_opt_with<T: Any>(
        &self,
        source: Option<&dyn Any>,
        prepare: impl FnOnce(&mut MapperContext<'_>),
    ) -> Result<Option<T>, MapError> {
        let mut ctx = self.context();
        prepare(&mut ctx);
        ctx.map_opt(source)
    }

    // -------------------------------------------------------------------------
    // Existing targets
    // -------------------------------------------------------------------------

    /// Run only the mutator for `source -> T` against `target` and hand the
    /// same target back. Never constructs and never derives collection
    /// mappings.
    ///
    /// # Errors
    ///
    /// [`MapError::NoMutator`] if no mutator resolves, or whatever the mutator
    /// raises.
    pub fn map_into<'t, T: Any>(
        &self,
        source: &dyn Any,
        target: &'t mut T,
    ) -> Result<&'t mut T, MapError> {
        let mut ctx = self.context();
        self.map_into_in(source, target, &mut ctx)
    }

    /// [`Mapper::map_into`] with a context prepared by `prepare`.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map_into`].
    pub fn map_into_with<'t, T: Any>(
        &self,
        source: &dyn Any,
        target: &'t mut T,
        prepare: impl FnOnce(&mut MapperContext<'_>),
    ) -> Result<&'t mut T, MapError> {
        let mut ctx = self.context();
        prepare(&mut ctx);
        self.map_into_in(source, target, &mut ctx)
    }

    // -------------------------------------------------------------------------
    // Batches
    // -------------------------------------------------------------------------

    /// Map each present item through [`Mapper::map`], skipping absent items,
    /// with one context shared by the whole batch.
    ///
    /// # Errors
    ///
    /// Fails on the first item that cannot be mapped.
    pub fn map_many<'s, T, I>(&self, sources: I) -> Result<Vec<T>, MapError>
    where
        T: Any,
        I: IntoIterator,
        I::Item: Into<Option<&'s dyn Any>>,
    {
        let mut ctx = self.context();
        self.map_many_in(sources, &mut ctx)
    }

    /// [`Mapper::map_many`] with the shared context prepared once by `prepare`.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map_many`].
    pub fn map_many_with<'s, T, I>(
        &self,
        sources: I,
        prepare: impl FnOnce(&mut MapperContext<'_>),
    ) -> Result<Vec<T>, MapError>
    where
        T: Any,
        I: IntoIterator,
        I::Item: Into<Option<&'s dyn Any>>,
    {
        let mut ctx = self.context();
        prepare(&mut ctx);
        self.map_many_in(sources, &mut ctx)
    }

    // -------------------------------------------------------------------------
    // Internals shared with MapperContext and the synthesizer
    // -------------------------------------------------------------------------

    pub(crate) fn map_in<T: Any>(
        &self,
        source: &dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<T, MapError> {
        let target = TypeKey::of::<T>();
        let (constructor, mutator) = self.resolve_pair(source.type_id(), target)?;

        let mut value = constructor.construct(source, ctx)?;
        self.scopes
            .run(|| mutator.mutate(source, value.as_mut(), ctx))?;

        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(MapError::TypeMismatch {
                expected: target.name().to_string(),
                found: self.names.name_of((*value).type_id()),
            }),
        }
    }

    pub(crate) fn map_into_in<'t, T: Any>(
        &self,
        source: &dyn Any,
        target: &'t mut T,
        ctx: &mut MapperContext<'_>,
    ) -> Result<&'t mut T, MapError> {
        let from = source.type_id();
        let mutator = self
            .resolver
            .mutator(from, TypeId::of::<T>())
            .ok_or_else(|| MapError::NoMutator {
                from: self.names.name_of(from),
                to: std::any::type_name::<T>().to_string(),
            })?;

        self.scopes
            .run(|| mutator.mutate(source, &mut *target, ctx))?;
        Ok(target)
    }

    pub(crate) fn map_many_in<'s, T, I>(
        &self,
        sources: I,
        ctx: &mut MapperContext<'_>,
    ) -> Result<Vec<T>, MapError>
    where
        T: Any,
        I: IntoIterator,
        I::Item: Into<Option<&'s dyn Any>>,
    {
        sources
            .into_iter()
            .filter_map(|item| -> Option<&'s dyn Any> { item.into() })
            .map(|source| self.map_in(source, ctx))
            .collect()
    }

    /// Constructor and mutator for `source -> target`, deriving a collection
    /// mapping when allowed and nothing direct exists.
    pub(crate) fn resolve_pair(
        &self,
        source: TypeId,
        target: TypeKey,
    ) -> Result<(ConstructorRef, MutatorRef), MapError> {
        if let Some(pair) = self.lookup(source, target.id()) {
            return Ok(pair);
        }
        if self.options.synthesize_collections && synth::synthesize(self, source, target)? {
            if let Some(pair) = self.lookup(source, target.id()) {
                return Ok(pair);
            }
        }
        Err(MapError::NoMapping {
            from: self.names.name_of(source),
            to: target.name().to_string(),
        })
    }

    fn lookup(&self, source: TypeId, target: TypeId) -> Option<(ConstructorRef, MutatorRef)> {
        let constructor = self.resolver.constructor(source, target)?;
        let mutator = self.resolver.mutator(source, target)?;
        Some((constructor, mutator))
    }

    pub(crate) fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub(crate) fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub(crate) fn scopes(&self) -> &ScopeCoordinator {
        &self.scopes
    }
}
