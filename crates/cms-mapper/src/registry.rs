//! Registration surface handed to profiles.
//!
//! A [`Profile`] groups the definitions for one area of the application (users,
//! content, media, ...). Profiles run once, in the order given, while the
//! [`Mapper`](crate::Mapper) is built; later registrations of the same pair
//! replace earlier ones so a host can override a default profile.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use cms_mapper::{MapDefinitions, Mapper, NullScopeProvider, Profile};
//!
//! struct User { name: String }
//! #[derive(Default)]
//! struct UserBasic { name: String }
//!
//! struct UserProfile;
//!
//! impl Profile for UserProfile {
//!     fn define_maps(&self, maps: &mut MapDefinitions) {
//!         maps.define_with::<User, UserBasic>(
//!             |_, _| Ok(UserBasic::default()),
//!             |user, basic, _| {
//!                 basic.name = user.name.clone();
//!                 Ok(())
//!             },
//!         );
//!     }
//! }
//!
//! let profiles: Vec<Box<dyn Profile>> = vec![Box::new(UserProfile)];
//! let mapper = Mapper::new(profiles, Arc::new(NullScopeProvider));
//! let basic: UserBasic = mapper.map(&User { name: "ada".into() }).unwrap();
//! assert_eq!(basic.name, "ada");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::MapperContext;
use crate::definition::{
    ConstructorRef, FnConstructor, FnMutator, MissingConstructor, MutatorRef, NoopMutator,
};
use crate::dispatch::{DispatchTable, Resolver};
use crate::error::MapError;
use crate::hierarchy::{projection, TypeHierarchy};
use crate::shape::ShapeRegistry;
use crate::types::{TypeKey, TypeNames};

/// A group of map definitions.
pub trait Profile: Send + Sync {
    /// Register this profile's definitions.
    fn define_maps(&self, maps: &mut MapDefinitions);
}

impl<F> Profile for F
where
    F: Fn(&mut MapDefinitions) + Send + Sync,
{
    fn define_maps(&self, maps: &mut MapDefinitions) {
        self(maps)
    }
}

/// Accumulates definitions, type relations and collection shapes before the
/// mapper is built.
#[derive(Default)]
pub struct MapDefinitions {
    constructors: HashMap<TypeId, HashMap<TypeId, ConstructorRef>>,
    mutators: HashMap<TypeId, HashMap<TypeId, MutatorRef>>,
    hierarchy: TypeHierarchy,
    shapes: ShapeRegistry,
    names: TypeNames,
}

impl MapDefinitions {
    /// Map `S` onto targets the caller always supplies: the constructor fails
    /// with [`MapError::NoConstructor`] and the mutator does nothing.
    pub fn define<S: Any, T: Any>(&mut self) -> &mut Self {
        self.insert::<S, T>(missing_constructor::<T>(), Arc::new(NoopMutator))
    }

    /// Map `S` onto caller-supplied targets with `mutator`.
    pub fn define_mutator<S: Any, T: Any>(
        &mut self,
        mutator: impl Fn(&S, &mut T, &mut MapperContext<'_>) -> Result<(), MapError>
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.insert::<S, T>(
            missing_constructor::<T>(),
            Arc::new(FnMutator::<S, T, _>::new(mutator)),
        )
    }

    /// Build complete `T` values from `S` with `constructor`.
    pub fn define_constructor<S: Any, T: Any>(
        &mut self,
        constructor: impl Fn(&S, &mut MapperContext<'_>) -> Result<T, MapError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.insert::<S, T>(
            Arc::new(FnConstructor::<S, T, _>::new(constructor)),
            Arc::new(NoopMutator),
        )
    }

    /// Register both roles for `S -> T`.
    pub fn define_with<S: Any, T: Any>(
        &mut self,
        constructor: impl Fn(&S, &mut MapperContext<'_>) -> Result<T, MapError> + Send + Sync + 'static,
        mutator: impl Fn(&S, &mut T, &mut MapperContext<'_>) -> Result<(), MapError>
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.insert::<S, T>(
            Arc::new(FnConstructor::<S, T, _>::new(constructor)),
            Arc::new(FnMutator::<S, T, _>::new(mutator)),
        )
    }

    /// Declare that `Sub` is a `Sup`: definitions for `Sup` sources apply to
    /// `Sub` sources through `upcast`.
    ///
    /// A type may extend several supertypes; see
    /// [`Mapper`](crate::Mapper) for how competing ancestors are ranked.
    pub fn extends<Sub: Any, Sup: Any>(
        &mut self,
        upcast: impl for<'a> Fn(&'a Sub) -> &'a Sup + Send + Sync + 'static,
    ) -> &mut Self {
        self.hierarchy.declare(
            TypeId::of::<Sub>(),
            TypeId::of::<Sup>(),
            projection::<Sub, Sup, _>(upcast),
        );
        self.names.record(TypeKey::of::<Sub>());
        self.names.record(TypeKey::of::<Sup>());
        self.shapes.add_standard_sources::<Sub>();
        self
    }

    /// Make container `C` of `E` usable on either side of a derived
    /// collection mapping.
    pub fn collection<C, E>(&mut self) -> &mut Self
    where
        C: FromIterator<E> + Any,
        for<'a> &'a C: IntoIterator<Item = &'a E>,
        E: Any,
    {
        self.shapes.add_custom::<C, E>();
        self.names.record(TypeKey::of::<C>());
        self.names.record(TypeKey::of::<E>());
        self
    }

    /// Number of registered `(S, T)` pairs.
    pub fn len(&self) -> usize {
        self.constructors.values().map(HashMap::len).sum()
    }

    /// Whether nothing has been defined yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert<S: Any, T: Any>(
        &mut self,
        constructor: ConstructorRef,
        mutator: MutatorRef,
    ) -> &mut Self {
        let (source, target) = (TypeId::of::<S>(), TypeId::of::<T>());
        self.constructors
            .entry(source)
            .or_default()
            .insert(target, constructor);
        self.mutators.entry(source).or_default().insert(target, mutator);
        self.names.record(TypeKey::of::<S>());
        self.names.record(TypeKey::of::<T>());
        self.shapes.add_standard_sources::<S>();
        self.shapes.add_standard_targets::<T>();
        self
    }

    pub(crate) fn into_parts(mut self) -> (Resolver, ShapeRegistry, TypeNames) {
        for key in self.shapes.keys().collect::<Vec<_>>() {
            self.names.record(key);
        }
        let resolver = Resolver::new(
            DispatchTable::from_map(self.constructors),
            DispatchTable::from_map(self.mutators),
            self.hierarchy,
        );
        (resolver, self.shapes, self.names)
    }

    pub(crate) fn relation_count(&self) -> usize {
        self.hierarchy.relation_count()
    }
}

fn missing_constructor<T: Any>() -> ConstructorRef {
    Arc::new(MissingConstructor {
        target: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Member {
        email: String,
    }
    #[derive(Default)]
    struct MemberDisplay {
        email: String,
    }

    #[test]
    fn every_form_registers_one_pair() {
        let mut maps = MapDefinitions::default();
        assert!(maps.is_empty());

        maps.define::<Member, MemberDisplay>();
        maps.define_mutator::<Member, MemberDisplay>(|m, d, _| {
            d.email = m.email.clone();
            Ok(())
        });
        maps.define_constructor::<Member, String>(|m, _| Ok(m.email.clone()));
        maps.define_with::<MemberDisplay, String>(|d, _| Ok(d.email.clone()), |_, _, _| Ok(()));

        assert_eq!(maps.len(), 3);
    }

    #[test]
    fn standard_shapes_follow_definitions() {
        let mut maps = MapDefinitions::default();
        maps.define::<Member, MemberDisplay>();
        assert!(maps.shapes.source(TypeId::of::<Vec<Member>>()).is_some());
        assert!(maps.shapes.target(TypeId::of::<Box<[MemberDisplay]>>()).is_some());
        assert!(maps.shapes.target(TypeId::of::<Vec<Member>>()).is_none());
        assert_eq!(maps.shapes.len(), 6);
    }

    #[test]
    fn closures_are_profiles() {
        let profile = |maps: &mut MapDefinitions| {
            maps.define::<Member, MemberDisplay>();
        };
        let mut maps = MapDefinitions::default();
        Profile::define_maps(&profile, &mut maps);
        assert_eq!(maps.len(), 1);
        assert_eq!(maps.relation_count(), 0);
    }
}
