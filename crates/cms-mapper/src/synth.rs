//! Derives `C<S> -> D<T>` mappings from a registered `S -> T` mapping.
//!
//! Runs only after direct resolution failed. When both sides have a registered
//! collection shape, the element pair is resolved (recursively, so nested
//! collections work when their shapes are registered) and a constructor that
//! maps every element inside a single scope is registered under the collection
//! pair. Its mutator is a no-op because the
//! constructor already produces the complete collection.

use std::any::{Any, TypeId};
use std::sync::Arc;

use tracing::debug;

use crate::context::MapperContext;
use crate::definition::{Construct, ConstructorRef, MutatorRef, NoopMutator};
use crate::error::MapError;
use crate::mapper::Mapper;
use crate::scope::ScopeCoordinator;
use crate::shape::{SourceShape, TargetShape};
use crate::types::TypeKey;

struct CollectionConstructor {
    source: SourceShape,
    target: TargetShape,
    constructor: ConstructorRef,
    mutator: MutatorRef,
    scopes: ScopeCoordinator,
}

impl Construct for CollectionConstructor {
    fn construct(
        &self,
        source: &dyn Any,
        ctx: &mut MapperContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        let elements = self
            .source
            .elements(source)
            .ok_or_else(|| MapError::TypeMismatch {
                expected: self.source.container.name().to_string(),
                found: format!("{:?}", source.type_id()),
            })?;

        let mapped = self.scopes.run(|| {
            let mut mapped = Vec::with_capacity(elements.len());
            for &element in &elements {
                let mut value = self.constructor.construct(element, ctx)?;
                self.mutator.mutate(element, value.as_mut(), ctx)?;
                mapped.push(value);
            }
            Ok(mapped)
        })?;

        self.target
            .collect(mapped)
            .ok_or_else(|| MapError::TypeMismatch {
                expected: self.target.element.name().to_string(),
                found: "an element of another type".to_string(),
            })
    }
}

/// Try to derive and register `source -> target`.
///
/// Returns `Ok(false)` when either side is not a known collection.
pub(crate) fn synthesize(mapper: &Mapper, source: TypeId, target: TypeKey) -> Result<bool, MapError> {
    let shapes = mapper.shapes();
    let (Some(source_shape), Some(target_shape)) =
        (shapes.source(source), shapes.target(target.id()))
    else {
        return Ok(false);
    };

    let (constructor, mutator) = mapper
        .resolve_pair(source_shape.element.id(), target_shape.element)
        .map_err(|err| match err {
            err if err.is_missing_definition() => MapError::NoElementMapping {
                from: source_shape.container.name().to_string(),
                to: target.name().to_string(),
                element_from: source_shape.element.name().to_string(),
                element_to: target_shape.element.name().to_string(),
            },
            err => err,
        })?;

    let derived: ConstructorRef = Arc::new(CollectionConstructor {
        source: *source_shape,
        target: *target_shape,
        constructor,
        mutator,
        scopes: mapper.scopes().clone(),
    });
    mapper
        .resolver()
        .register(source, target.id(), derived, Arc::new(NoopMutator));

    debug!(
        from = source_shape.container.name(),
        to = target.name(),
        kind = ?target_shape.kind,
        pairs = mapper.resolver().pair_count(),
        "synthesized collection mapping"
    );
    Ok(true)
}
