//! Object-to-object mapping engine.
//!
//! Converts persistence and domain entities into presentation models (and
//! back) without hand-written glue per pair: profiles register a constructor
//! and/or a mutator for each `(source, target)` type pair once, and the
//! [`Mapper`] dispatches on the runtime type of whatever it is given.
//!
//! # Components
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | Definition registry | [`registry`] | `define*` forms, subtype relations, collection shapes |
//! | Dispatch resolver | `dispatch` | exact lookup, nearest-ancestor fallback, memoization |
//! | Collection synthesizer | `synth` | derives `C<S> -> D<T>` from `S -> T` |
//! | Orchestrator | [`Mapper`] | public `map*` surface |
//! | Scope coordinator | [`scope`] | one unit-of-work scope per mutation or collection loop |
//! | Context | [`MapperContext`] | per-call selectors and items, nested mapping |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cms_mapper::{MapDefinitions, Mapper, NullScopeProvider, Profile};
//!
//! struct Dog { name: String }
//! struct Poodle { dog: Dog, clip: &'static str }
//! #[derive(Default, Debug, PartialEq)]
//! struct DogView { name: String }
//!
//! let profile = |maps: &mut MapDefinitions| {
//!     maps.define_with::<Dog, DogView>(
//!         |_, _| Ok(DogView::default()),
//!         |dog, view, _| {
//!             view.name = dog.name.clone();
//!             Ok(())
//!         },
//!     );
//!     maps.extends::<Poodle, Dog>(|p| &p.dog);
//! };
//! let profiles: Vec<Box<dyn Profile>> = vec![Box::new(profile)];
//! let mapper = Mapper::new(profiles, Arc::new(NullScopeProvider));
//!
//! let fifi = Poodle { dog: Dog { name: "Fifi".into() }, clip: "lion" };
//! let view: DogView = mapper.map(&fifi).unwrap();
//! assert_eq!(view.name, "Fifi");
//!
//! let many = vec![fifi];
//! let views: Vec<DogView> = mapper.map(&many).unwrap();
//! assert_eq!(views, vec![DogView { name: "Fifi".into() }]);
//!
//! let none: Option<DogView> = mapper.map_opt(None).unwrap();
//! assert!(none.is_none());
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod config;
mod context;
mod definition;
mod dispatch;
mod error;
mod hierarchy;
mod mapper;
pub mod registry;
pub mod scope;
mod shape;
mod synth;
mod types;

pub use config::MapperOptions;
pub use context::MapperContext;
pub use definition::{Construct, Mutate};
pub use error::MapError;
pub use mapper::Mapper;
pub use registry::{MapDefinitions, Profile};
pub use scope::{NullScopeProvider, Scope, ScopeProvider};
pub use types::TypeKey;
