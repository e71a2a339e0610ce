//! Dispatch tables and the resolver that consults them.
//!
//! # Table layout
//!
//! ```text
//! source TypeId ──(DashMap)──▶ Arc<HashMap<target TypeId, entry>>
//! ```
//!
//! The outer map is concurrent. An inner map is never edited after it is
//! published: adding a pair clones it, inserts, and swaps the `Arc` while the
//! outer entry is locked. Readers therefore see either the old or the new inner
//! map, never a partial one, and racing writers for different targets of the
//! same source cannot lose each other's entries.
//!
//! # Resolution
//!
//! 1. Exact `(source, target)` hit.
//! 2. Otherwise the ancestors of `source` are tried closest first (see
//!    [`TypeHierarchy`]); the first with an entry for `target` wins.
//! 3. A hit from step 2 is wrapped to project the source down the ancestor path
//!    and cached under the exact `source`, so the next lookup stops at step 1.
//!
//! Cached entries are never removed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::context::MapperContext;
use crate::definition::{Construct, ConstructorRef, Mutate, MutatorRef};
use crate::error::MapError;
use crate::hierarchy::{project, Projection, TypeHierarchy};

/// Concurrent two-level `(source, target) -> entry` table.
pub(crate) struct DispatchTable<V> {
    entries: DashMap<TypeId, Arc<HashMap<TypeId, V>>>,
}

impl<V: Clone> DispatchTable<V> {
    pub(crate) fn from_map(map: HashMap<TypeId, HashMap<TypeId, V>>) -> Self {
        let entries = DashMap::with_capacity(map.len());
        for (source, targets) in map {
            entries.insert(source, Arc::new(targets));
        }
        Self { entries }
    }

    pub(crate) fn get(&self, source: TypeId, target: TypeId) -> Option<V> {
        let targets = self.entries.get(&source)?;
        targets.get(&target).cloned()
    }

    /// Merge `(source, target) -> value` in, replacing any previous entry.
    pub(crate) fn insert(&self, source: TypeId, target: TypeId, value: V) {
        self.entries
            .entry(source)
            .and_modify(|targets| {
                let mut merged = HashMap::clone(targets);
                merged.insert(target, value.clone());
                *targets = Arc::new(merged);
            })
            .or_insert_with(|| Arc::new(HashMap::from([(target, value.clone())])));
    }

    /// Number of `(source, target)` pairs.
    pub(crate) fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }
}

/// Constructor that projects its source to an ancestor first.
struct ProjectedConstructor {
    path: Arc<[Projection]>,
    inner: ConstructorRef,
}

impl Construct for ProjectedConstructor {
    fn construct(
        &self,
        source: &dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        let source = project(&self.path, source).ok_or_else(|| projection_failed(source))?;
        self.inner.construct(source, ctx)
    }
}

/// Mutator that projects its source to an ancestor first.
struct ProjectedMutator {
    path: Arc<[Projection]>,
    inner: MutatorRef,
}

impl Mutate for ProjectedMutator {
    fn mutate(
        &self,
        source: &dyn Any,
        target: &mut dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<(), MapError> {
        let source = project(&self.path, source).ok_or_else(|| projection_failed(source))?;
        self.inner.mutate(source, target, ctx)
    }
}

fn projection_failed(source: &dyn Any) -> MapError {
    MapError::TypeMismatch {
        expected: "a value the declared projection accepts".to_string(),
        found: format!("{:?}", source.type_id()),
    }
}

/// Looks up constructors and mutators, falling back along the type hierarchy.
pub(crate) struct Resolver {
    constructors: DispatchTable<ConstructorRef>,
    mutators: DispatchTable<MutatorRef>,
    hierarchy: TypeHierarchy,
}

impl Resolver {
    pub(crate) fn new(
        constructors: DispatchTable<ConstructorRef>,
        mutators: DispatchTable<MutatorRef>,
        hierarchy: TypeHierarchy,
    ) -> Self {
        Self {
            constructors,
            mutators,
            hierarchy,
        }
    }

    pub(crate) fn constructor(&self, source: TypeId, target: TypeId) -> Option<ConstructorRef> {
        resolve(&self.constructors, &self.hierarchy, source, target, |path, inner| {
            Arc::new(ProjectedConstructor { path, inner }) as ConstructorRef
        })
    }

    pub(crate) fn mutator(&self, source: TypeId, target: TypeId) -> Option<MutatorRef> {
        resolve(&self.mutators, &self.hierarchy, source, target, |path, inner| {
            Arc::new(ProjectedMutator { path, inner }) as MutatorRef
        })
    }

    /// Register a derived pair; replaces whatever was there.
    pub(crate) fn register(
        &self,
        source: TypeId,
        target: TypeId,
        constructor: ConstructorRef,
        mutator: MutatorRef,
    ) {
        self.constructors.insert(source, target, constructor);
        self.mutators.insert(source, target, mutator);
    }

    /// Exact presence in both tables, without resolving.
    pub(crate) fn contains(&self, source: TypeId, target: TypeId) -> bool {
        self.constructors.get(source, target).is_some()
            && self.mutators.get(source, target).is_some()
    }

    pub(crate) fn pair_count(&self) -> usize {
        self.constructors.len()
    }
}

fn resolve<V: Clone>(
    table: &DispatchTable<V>,
    hierarchy: &TypeHierarchy,
    source: TypeId,
    target: TypeId,
    wrap: impl Fn(Arc<[Projection]>, V) -> V,
) -> Option<V> {
    if let Some(hit) = table.get(source, target) {
        return Some(hit);
    }

    for (ancestor, path) in hierarchy.ancestors(source) {
        let Some(inherited) = table.get(ancestor, target) else {
            continue;
        };
        let depth = path.len();
        let resolved = wrap(path.into(), inherited);
        table.insert(source, target, resolved.clone());
        trace!(?source, ?ancestor, ?target, depth, "memoized inherited definition");
        return Some(resolved);
    }
    None
}
