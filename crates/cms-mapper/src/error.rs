//! Mapping failures.
//!
//! Every variant other than [`MapError::Other`] signals a missing or broken
//! registration, i.e. a configuration bug rather than a per-request condition.
//! The engine never recovers from them internally.

use thiserror::Error;

/// Error raised by the mapping engine.
#[derive(Debug, Error)]
pub enum MapError {
    /// The pair was registered without a constructor (`define` or
    /// `define_mutator`) and a fresh target was requested.
    #[error("don't know how to construct {target}")]
    NoConstructor {
        /// Target type that could not be constructed.
        target: String,
    },

    /// Neither a direct mapping nor a derivable collection mapping exists.
    #[error("don't know how to map {from} to {to}")]
    NoMapping {
        /// Runtime source type.
        from: String,
        /// Requested target type.
        to: String,
    },

    /// Both types are collections but their elements cannot be mapped.
    #[error(
        "don't know how to map {element_from} to {element_to}, \
         so don't know how to map {from} to {to}"
    )]
    NoElementMapping {
        /// Source collection type.
        from: String,
        /// Target collection type.
        to: String,
        /// Source element type.
        element_from: String,
        /// Target element type.
        element_to: String,
    },

    /// Mapping into an existing target needs a mutator and none resolved.
    #[error("don't know how to map {from} into an existing {to}")]
    NoMutator {
        /// Runtime source type.
        from: String,
        /// Type of the pre-existing target.
        to: String,
    },

    /// An erased value did not have the type its definition promised.
    #[error("expected a value of type {expected}, found {found}")]
    TypeMismatch {
        /// Type the definition was registered for.
        expected: String,
        /// Type actually seen, when known.
        found: String,
    },

    /// Failure raised by a constructor or mutator, e.g. a lazy load.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MapError {
    /// True for the registration errors (`NoConstructor`, `NoMapping`,
    /// `NoElementMapping`, `NoMutator`).
    pub fn is_missing_definition(&self) -> bool {
        matches!(
            self,
            MapError::NoConstructor { .. }
                | MapError::NoMapping { .. }
                | MapError::NoElementMapping { .. }
                | MapError::NoMutator { .. }
        )
    }
}
