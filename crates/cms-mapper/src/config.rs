//! Mapper configuration.

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Options fixed at mapper construction.
///
/// With the `serde` feature, options deserialize from host configuration; any
/// missing field takes its default.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct MapperOptions {
    /// Derive `C<S> -> C<T>` mappings from element mappings on demand.
    pub synthesize_collections: bool,
    /// Culture every new [`MapperContext`](crate::MapperContext) starts with.
    pub default_culture: Option<String>,
    /// Segment every new [`MapperContext`](crate::MapperContext) starts with.
    pub default_segment: Option<String>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            synthesize_collections: true,
            default_culture: None,
            default_segment: None,
        }
    }
}

impl MapperOptions {
    /// Enable or disable collection synthesis.
    pub fn with_collection_synthesis(mut self, enabled: bool) -> Self {
        self.synthesize_collections = enabled;
        self
    }

    /// Seed contexts with `culture`.
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.default_culture = Some(culture.into());
        self
    }

    /// Seed contexts with `segment`.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.default_segment = Some(segment.into());
        self
    }
}
