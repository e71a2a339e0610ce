//! Per-call parameter bag threaded through nested mappings.
//!
//! One context is created for each top-level call on [`Mapper`] and handed to
//! every constructor and mutator involved. Mutators map nested fields through
//! the same context (see [`MapperContext::map`]) so ambient selectors such as
//! the culture stay visible all the way down the call tree.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::MapError;
use crate::mapper::Mapper;

/// Ambient state for one mapping call tree.
pub struct MapperContext<'m> {
    mapper: &'m Mapper,
    items: Option<HashMap<String, Box<dyn Any>>>,
    culture: Option<String>,
    segment: Option<String>,
    included_properties: Option<Vec<String>>,
}

impl<'m> MapperContext<'m> {
    /// New context bound to `mapper`, seeded from its options.
    pub fn new(mapper: &'m Mapper) -> Self {
        let options = mapper.options();
        Self {
            mapper,
            items: None,
            culture: options.default_culture.clone(),
            segment: options.default_segment.clone(),
            included_properties: None,
        }
    }

    /// The mapper this context maps through.
    pub fn mapper(&self) -> &'m Mapper {
        self.mapper
    }

    // -------------------------------------------------------------------------
    // Nested mapping
    // -------------------------------------------------------------------------

    /// Map `source` to a new `T` using this context.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map<T: Any>(&mut self, source: &dyn Any) -> Result<T, MapError> {
        let mapper = self.mapper;
        mapper.map_in(source, self)
    }

    /// Map an optional source; an absent source yields `None` without any lookup.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_opt<T: Any>(&mut self, source: Option<&dyn Any>) -> Result<Option<T>, MapError> {
        match source {
            Some(source) => self.map(source).map(Some),
            None => Ok(None),
        }
    }

    /// Map `source` onto an existing `target`, returning that same target.
    ///
    /// # Errors
    ///
    /// See [`Mapper::map_into`].
    pub fn map_into<'t, T: Any>(
        &mut self,
        source: &dyn Any,
        target: &'t mut T,
    ) -> Result<&'t mut T, MapError> {
        let mapper = self.mapper;
        mapper.map_into_in(source, target, self)
    }

    /// Map every present item, skipping absent ones.
    ///
    /// # Errors
    ///
    /// Fails on the first item that cannot be mapped.
    pub fn map_many<'s, T, I>(&mut self, sources: I) -> Result<Vec<T>, MapError>
    where
        T: Any,
        I: IntoIterator,
        I::Item: Into<Option<&'s dyn Any>>,
    {
        let mapper = self.mapper;
        mapper.map_many_in(sources, self)
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Whether the item bag holds anything. Does not allocate the bag.
    pub fn has_items(&self) -> bool {
        self.items.as_ref().is_some_and(|items| !items.is_empty())
    }

    /// Store `value` under `key`, replacing any previous item.
    pub fn set_item<V: Any>(&mut self, key: impl Into<String>, value: V) {
        self.items
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Box::new(value));
    }

    /// The item under `key`, if present and of type `V`.
    pub fn item<V: Any>(&self, key: &str) -> Option<&V> {
        self.items.as_ref()?.get(key)?.downcast_ref::<V>()
    }

    /// Mutable access to the item under `key`, if present and of type `V`.
    pub fn item_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.items.as_mut()?.get_mut(key)?.downcast_mut::<V>()
    }

    /// Remove and return the item under `key`, if present and of type `V`.
    ///
    /// An item of another type is left in place.
    pub fn remove_item<V: Any>(&mut self, key: &str) -> Option<V> {
        let items = self.items.as_mut()?;
        if !items.get(key)?.is::<V>() {
            return None;
        }
        items.remove(key)?.downcast::<V>().ok().map(|v| *v)
    }

    // -------------------------------------------------------------------------
    // Selectors
    // -------------------------------------------------------------------------

    /// Culture selector (e.g. `"da-DK"`), if any.
    pub fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }

    /// Set or clear the culture selector.
    pub fn set_culture(&mut self, culture: Option<impl Into<String>>) {
        self.culture = culture.map(Into::into);
    }

    /// Segment selector, if any.
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// Set or clear the segment selector.
    pub fn set_segment(&mut self, segment: Option<impl Into<String>>) {
        self.segment = segment.map(Into::into);
    }

    /// Property aliases to include, when restricted.
    pub fn included_properties(&self) -> Option<&[String]> {
        self.included_properties.as_deref()
    }

    /// Restrict mapped properties to `aliases`.
    pub fn set_included_properties<I, S>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_properties = Some(aliases.into_iter().map(Into::into).collect());
    }

    /// Whether `alias` passes the included-properties filter (always true when
    /// no filter is set). Aliases compare case-insensitively.
    pub fn includes_property(&self, alias: &str) -> bool {
        match &self.included_properties {
            None => true,
            Some(list) => list.iter().any(|a| a.eq_ignore_ascii_case(alias)),
        }
    }
}

impl fmt::Debug for MapperContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self
            .items
            .iter()
            .flat_map(|items| items.keys().map(String::as_str))
            .collect();
        f.debug_struct("MapperContext")
            .field("culture", &self.culture)
            .field("segment", &self.segment)
            .field("included_properties", &self.included_properties)
            .field("items", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::NullScopeProvider;
    use crate::{MapperOptions, Profile};
    use std::sync::Arc;

    fn mapper(options: MapperOptions) -> Mapper {
        Mapper::with_options(
            Vec::<Box<dyn Profile>>::new(),
            Arc::new(NullScopeProvider),
            options,
        )
    }

    #[test]
    fn items_are_lazy_and_typed() {
        let mapper = mapper(MapperOptions::default());
        let mut ctx = MapperContext::new(&mapper);
        assert!(!ctx.has_items());
        assert!(ctx.item::<u32>("CurrentUser").is_none());

        ctx.set_item("CurrentUser", 7u32);
        assert!(ctx.has_items());
        assert_eq!(ctx.item::<u32>("CurrentUser"), Some(&7));
        assert!(ctx.item::<String>("CurrentUser").is_none());

        if let Some(v) = ctx.item_mut::<u32>("CurrentUser") {
            *v += 1;
        }
        assert_eq!(ctx.remove_item::<String>("CurrentUser"), None);
        assert_eq!(ctx.remove_item::<u32>("CurrentUser"), Some(8));
        assert!(!ctx.has_items());
    }

    #[test]
    fn selectors_start_from_options() {
        let mapper = mapper(MapperOptions::default().with_culture("en-US"));
        let mut ctx = MapperContext::new(&mapper);
        assert_eq!(ctx.culture(), Some("en-US"));
        assert_eq!(ctx.segment(), None);

        ctx.set_culture(Some("da-DK"));
        ctx.set_segment(Some("mobile"));
        assert_eq!(ctx.culture(), Some("da-DK"));
        assert_eq!(ctx.segment(), Some("mobile"));

        ctx.set_culture(None::<String>);
        assert_eq!(ctx.culture(), None);
    }

    #[test]
    fn included_properties_filter() {
        let mapper = mapper(MapperOptions::default());
        let mut ctx = MapperContext::new(&mapper);
        assert!(ctx.includes_property("anything"));

        ctx.set_included_properties(["title", "bodyText"]);
        assert!(ctx.includes_property("Title"));
        assert!(ctx.includes_property("bodytext"));
        assert!(!ctx.includes_property("author"));
        assert_eq!(ctx.included_properties().map(<[String]>::len), Some(2));
    }

    #[test]
    fn absent_sources_short_circuit() {
        let mapper = mapper(MapperOptions::default());
        let mut ctx = MapperContext::new(&mapper);
        let mapped: Option<String> = ctx.map_opt(None).unwrap();
        assert!(mapped.is_none());
    }
}
