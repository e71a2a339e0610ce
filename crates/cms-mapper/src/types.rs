//! Runtime type identity used to key the dispatch tables.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::MapError;

/// A [`TypeId`] paired with the type's name for diagnostics.
///
/// Equality and hashing only consider the id.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler-provided type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Names of every type the registration surface has seen.
///
/// A `&dyn Any` only yields its `TypeId`, so error messages look names up here.
#[derive(Default)]
pub(crate) struct TypeNames {
    names: HashMap<TypeId, &'static str>,
}

impl TypeNames {
    pub(crate) fn record(&mut self, key: TypeKey) {
        self.names.insert(key.id, key.name);
    }

    pub(crate) fn name_of(&self, id: TypeId) -> String {
        match self.names.get(&id) {
            Some(name) => (*name).to_string(),
            None => format!("<unregistered {id:?}>"),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

/// Borrow `value` as `T`, reporting the mismatch otherwise.
pub(crate) fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T, MapError> {
    value.downcast_ref::<T>().ok_or_else(|| MapError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        found: format!("{:?}", value.type_id()),
    })
}

/// Mutably borrow `value` as `T`, reporting the mismatch otherwise.
pub(crate) fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, MapError> {
    let found = (*value).type_id();
    value
        .downcast_mut::<T>()
        .ok_or_else(|| MapError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: format!("{found:?}"),
        })
}
