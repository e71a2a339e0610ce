//! Collection shapes: how to read elements out of a source container and how
//! to collect mapped elements into a target container.
//!
//! A `TypeId` carries no structure, so every container type the synthesizer can
//! work with is described here ahead of time. Defining a pair `S -> T` records
//! the standard containers of both sides automatically.

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};

use crate::types::TypeKey;

type Elements = for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>;
type Collect = fn(Vec<Box<dyn Any>>) -> Option<Box<dyn Any>>;

/// What a target container looks like, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollectionKind {
    /// Growable sequence (`Vec<T>`, `VecDeque<T>`).
    List,
    /// Fixed-length boxed slice (`Box<[T]>`).
    Array,
    /// Any container registered explicitly by a profile.
    Custom,
}

/// Reads the elements of a source container.
#[derive(Clone, Copy)]
pub(crate) struct SourceShape {
    pub(crate) container: TypeKey,
    pub(crate) element: TypeKey,
    elements: Elements,
}

impl SourceShape {
    pub(crate) fn elements<'a>(&self, value: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        (self.elements)(value)
    }
}

/// Builds a target container from mapped elements.
#[derive(Clone, Copy)]
pub(crate) struct TargetShape {
    pub(crate) container: TypeKey,
    pub(crate) element: TypeKey,
    pub(crate) kind: CollectionKind,
    collect: Collect,
}

impl TargetShape {
    pub(crate) fn collect(&self, items: Vec<Box<dyn Any>>) -> Option<Box<dyn Any>> {
        (self.collect)(items)
    }
}

fn slice_elements<C, E>(value: &dyn Any) -> Option<Vec<&dyn Any>>
where
    C: AsRef<[E]> + Any,
    E: Any,
{
    let container = value.downcast_ref::<C>()?;
    Some(container.as_ref().iter().map(|e| e as &dyn Any).collect())
}

fn iter_elements<C, E>(value: &dyn Any) -> Option<Vec<&dyn Any>>
where
    C: Any,
    for<'a> &'a C: IntoIterator<Item = &'a E>,
    E: Any,
{
    let container = value.downcast_ref::<C>()?;
    Some(container.into_iter().map(|e| e as &dyn Any).collect())
}

fn collect_into<C, E>(items: Vec<Box<dyn Any>>) -> Option<Box<dyn Any>>
where
    C: FromIterator<E> + Any,
    E: Any,
{
    let collected: Option<C> = items
        .into_iter()
        .map(|item| item.downcast::<E>().ok().map(|e| *e))
        .collect();
    collected.map(|c| Box::new(c) as Box<dyn Any>)
}

/// Registered container shapes, keyed by container type.
#[derive(Default)]
pub(crate) struct ShapeRegistry {
    sources: HashMap<TypeId, SourceShape>,
    targets: HashMap<TypeId, TargetShape>,
}

impl ShapeRegistry {
    /// `Vec<E>`, `VecDeque<E>` and `Box<[E]>` as sources.
    pub(crate) fn add_standard_sources<E: Any>(&mut self) {
        self.add_source(SourceShape {
            container: TypeKey::of::<Vec<E>>(),
            element: TypeKey::of::<E>(),
            elements: slice_elements::<Vec<E>, E>,
        });
        self.add_source(SourceShape {
            container: TypeKey::of::<Box<[E]>>(),
            element: TypeKey::of::<E>(),
            elements: slice_elements::<Box<[E]>, E>,
        });
        self.add_source(SourceShape {
            container: TypeKey::of::<VecDeque<E>>(),
            element: TypeKey::of::<E>(),
            elements: iter_elements::<VecDeque<E>, E>,
        });
    }

    /// `Vec<E>`, `VecDeque<E>` and `Box<[E]>` as targets.
    pub(crate) fn add_standard_targets<E: Any>(&mut self) {
        self.add_target(TargetShape {
            container: TypeKey::of::<Vec<E>>(),
            element: TypeKey::of::<E>(),
            kind: CollectionKind::List,
            collect: collect_into::<Vec<E>, E>,
        });
        self.add_target(TargetShape {
            container: TypeKey::of::<VecDeque<E>>(),
            element: TypeKey::of::<E>(),
            kind: CollectionKind::List,
            collect: collect_into::<VecDeque<E>, E>,
        });
        self.add_target(TargetShape {
            container: TypeKey::of::<Box<[E]>>(),
            element: TypeKey::of::<E>(),
            kind: CollectionKind::Array,
            collect: collect_into::<Box<[E]>, E>,
        });
    }

    /// An arbitrary container, usable on either side.
    pub(crate) fn add_custom<C, E>(&mut self)
    where
        C: FromIterator<E> + Any,
        for<'a> &'a C: IntoIterator<Item = &'a E>,
        E: Any,
    {
        self.add_source(SourceShape {
            container: TypeKey::of::<C>(),
            element: TypeKey::of::<E>(),
            elements: iter_elements::<C, E>,
        });
        self.add_target(TargetShape {
            container: TypeKey::of::<C>(),
            element: TypeKey::of::<E>(),
            kind: CollectionKind::Custom,
            collect: collect_into::<C, E>,
        });
    }

    fn add_source(&mut self, shape: SourceShape) {
        self.sources.insert(shape.container.id(), shape);
    }

    fn add_target(&mut self, shape: TargetShape) {
        self.targets.insert(shape.container.id(), shape);
    }

    pub(crate) fn source(&self, id: TypeId) -> Option<&SourceShape> {
        self.sources.get(&id)
    }

    pub(crate) fn target(&self, id: TypeId) -> Option<&TargetShape> {
        self.targets.get(&id)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        let sources = self
            .sources
            .values()
            .flat_map(|s| [s.container, s.element]);
        let targets = self
            .targets
            .values()
            .flat_map(|t| [t.container, t.element]);
        sources.chain(targets)
    }

    pub(crate) fn len(&self) -> usize {
        self.sources.len() + self.targets.len()
    }
}
