//! Declared subtype relations between mapped types.
//!
//! A relation `Sub extends Sup` carries a projection that borrows the `Sup`
//! view out of a `Sub` value. Definitions registered for `Sup` then apply to
//! `Sub` sources by projecting first.
//!
//! # Resolution order
//!
//! [`TypeHierarchy::ancestors`] walks breadth-first from the runtime type, so
//! closer ancestors always come before farther ones. Ancestors at the same
//! depth keep the order in which their relations were declared. A type reached
//! twice (diamond, cycle) is only visited through its first path.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Borrow a supertype view out of an erased subtype value.
pub(crate) type Projection = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

fn erase<F>(f: F) -> Projection
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a typed projection so it operates on erased values.
pub(crate) fn projection<Sub, Sup, F>(f: F) -> Projection
where
    Sub: Any,
    Sup: Any,
    F: for<'a> Fn(&'a Sub) -> &'a Sup + Send + Sync + 'static,
{
    erase(move |value| value.downcast_ref::<Sub>().map(|sub| f(sub) as &dyn Any))
}

/// Apply a projection path to `value`, most derived step first.
pub(crate) fn project<'a>(path: &[Projection], value: &'a dyn Any) -> Option<&'a dyn Any> {
    path.iter().try_fold(value, |current, step| step(current))
}

struct Parent {
    id: TypeId,
    project: Projection,
}

/// Immutable-after-build map from a type to its declared supertypes.
#[derive(Default)]
pub(crate) struct TypeHierarchy {
    parents: HashMap<TypeId, Vec<Parent>>,
}

impl TypeHierarchy {
    /// Declare `sub` as extending `sup`. Redeclaring the same edge replaces
    /// its projection but keeps its position.
    pub(crate) fn declare(&mut self, sub: TypeId, sup: TypeId, project: Projection) {
        let parents = self.parents.entry(sub).or_default();
        match parents.iter_mut().find(|p| p.id == sup) {
            Some(existing) => existing.project = project,
            None => parents.push(Parent { id: sup, project }),
        }
    }

    /// Every proper ancestor of `id` with the projection path that reaches it,
    /// closest first.
    pub(crate) fn ancestors(&self, id: TypeId) -> Vec<(TypeId, Vec<Projection>)> {
        let mut found = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([(id, Vec::<Projection>::new())]);

        while let Some((current, path)) = queue.pop_front() {
            let Some(parents) = self.parents.get(&current) else {
                continue;
            };
            for parent in parents {
                if !seen.insert(parent.id) {
                    continue;
                }
                let mut next = path.clone();
                next.push(parent.project.clone());
                found.push((parent.id, next.clone()));
                queue.push_back((parent.id, next));
            }
        }
        found
    }

    pub(crate) fn relation_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }
}
