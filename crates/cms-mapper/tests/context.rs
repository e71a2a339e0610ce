//! Context preparation, existing targets, and absent sources.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::any::Any;
use std::cell::Cell;
use std::ptr;
use std::sync::Arc;

use cms_mapper::{
    MapDefinitions, MapError, Mapper, MapperContext, MapperOptions, NullScopeProvider, Profile,
};

struct Content {
    name: String,
    properties: Vec<(String, String)>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct ContentDisplay {
    name: String,
    culture: Option<String>,
    properties: Vec<(String, String)>,
    editor: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
struct ContentSave {
    name: String,
}

struct CurrentUser(String);

fn profile(maps: &mut MapDefinitions) {
    maps.define_with::<Content, ContentDisplay>(
        |_, _| Ok(ContentDisplay::default()),
        |content, display, ctx| {
            display.name = content.name.clone();
            display.culture = ctx.culture().map(str::to_string);
            display.properties = content
                .properties
                .iter()
                .filter(|(alias, _)| ctx.includes_property(alias))
                .cloned()
                .collect();
            display.editor = ctx.item::<CurrentUser>("currentUser").map(|u| u.0.clone());
            Ok(())
        },
    );
    maps.define_mutator::<ContentSave, Content>(|save, content, _| {
        content.name = save.name.clone();
        Ok(())
    });
    maps.define_mutator::<ContentDisplay, ContentDisplay>(|from, to, _| {
        to.clone_from(from);
        Ok(())
    });
}

fn mapper() -> Mapper {
    mapper_with_options(MapperOptions::default())
}

fn mapper_with_options(options: MapperOptions) -> Mapper {
    let profiles: Vec<Box<dyn Profile>> = vec![Box::new(profile)];
    Mapper::with_options(profiles, Arc::new(NullScopeProvider), options)
}

fn content() -> Content {
    Content {
        name: "Home".into(),
        properties: vec![
            ("title".into(), "Welcome".into()),
            ("bodyText".into(), "<p>Hi</p>".into()),
            ("umbracoNaviHide".into(), "0".into()),
        ],
    }
}

// =============================================================================
// Context preparation
// =============================================================================

#[test]
fn prepare_runs_once_before_mapping() {
    let mapper = mapper();
    let calls = Cell::new(0);
    let display: ContentDisplay = mapper
        .map_with(&content(), |ctx| {
            calls.set(calls.get() + 1);
            ctx.set_culture(Some("da-DK"));
            ctx.set_item("currentUser", CurrentUser("editor@example.com".into()));
            ctx.set_included_properties(["title", "BODYTEXT"]);
        })
        .unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(display.culture.as_deref(), Some("da-DK"));
    assert_eq!(display.editor.as_deref(), Some("editor@example.com"));
    let aliases: Vec<&str> = display.properties.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(aliases, ["title", "bodyText"]);
}

#[test]
fn prepare_runs_for_absent_sources_too() {
    let mapper = mapper();
    let calls = Cell::new(0);
    let none: Option<ContentDisplay> = mapper
        .map_opt_with(None, |_| calls.set(calls.get() + 1))
        .unwrap();
    assert!(none.is_none());
    assert_eq!(calls.get(), 1);
}

#[test]
fn batches_share_one_prepared_context() {
    let mapper = mapper();
    let calls = Cell::new(0);
    let (a, b) = (content(), content());
    let items: [&dyn Any; 2] = [&a, &b];
    let displays: Vec<ContentDisplay> = mapper
        .map_many_with(items, |ctx| {
            calls.set(calls.get() + 1);
            ctx.set_segment(Some("mobile"));
            ctx.set_culture(Some("en-GB"));
        })
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert!(displays
        .iter()
        .all(|d| d.culture.as_deref() == Some("en-GB")));
}

#[test]
fn contexts_start_from_configured_defaults() {
    let mapper = mapper_with_options(MapperOptions::default().with_culture("sv-SE"));
    let display: ContentDisplay = mapper.map(&content()).unwrap();
    assert_eq!(display.culture.as_deref(), Some("sv-SE"));

    let cleared: ContentDisplay = mapper
        .map_with(&content(), |ctx| ctx.set_culture(None::<&str>))
        .unwrap();
    assert_eq!(cleared.culture, None);
}

#[test]
fn caller_owned_contexts_carry_state_across_calls() {
    let mapper = mapper();
    let mut ctx: MapperContext<'_> = mapper.context();
    ctx.set_item("currentUser", CurrentUser("admin".into()));

    let first: ContentDisplay = ctx.map(&content()).unwrap();
    let second: Option<ContentDisplay> = ctx.map_opt(Some(&content() as &dyn Any)).unwrap();
    assert_eq!(first.editor.as_deref(), Some("admin"));
    assert_eq!(second.and_then(|d| d.editor).as_deref(), Some("admin"));
    assert!(ptr::eq(ctx.mapper(), &mapper));
}

// =============================================================================
// Absent sources
// =============================================================================

#[test]
fn absent_sources_map_to_none_without_lookup() {
    let mapper = mapper();
    let display: Option<ContentDisplay> = mapper.map_opt(None).unwrap();
    assert!(display.is_none());

    // Not mappable at all, still no error for an absent source.
    let unmapped: Option<u64> = mapper.map_opt(None).unwrap();
    assert!(unmapped.is_none());
}

#[test]
fn present_sources_through_map_opt_behave_like_map() {
    let mapper = mapper();
    let source = content();
    let display: Option<ContentDisplay> = mapper.map_opt(Some(&source as &dyn Any)).unwrap();
    assert_eq!(display.map(|d| d.name).as_deref(), Some("Home"));

    let err = mapper
        .map_opt::<u64>(Some(&source as &dyn Any))
        .unwrap_err();
    assert!(matches!(err, MapError::NoMapping { .. }));
}

// =============================================================================
// Existing targets
// =============================================================================

#[test]
fn map_into_returns_the_same_target() {
    let mapper = mapper();
    let mut target = Content {
        name: "Old".into(),
        properties: vec![("title".into(), "kept".into())],
    };
    let target_ptr: *const Content = &target;

    let returned = mapper
        .map_into(
            &ContentSave {
                name: "New".into(),
            },
            &mut target,
        )
        .unwrap();
    assert!(ptr::eq(returned, target_ptr));
    assert_eq!(returned.name, "New");
    assert_eq!(returned.properties.len(), 1);
}

#[test]
fn mutator_only_pairs_cannot_construct() {
    let mapper = mapper();
    let err = mapper
        .map::<Content>(&ContentSave {
            name: "New".into(),
        })
        .err()
        .unwrap();
    assert!(matches!(err, MapError::NoConstructor { .. }), "{err}");
}

#[test]
fn identity_mutators_copy_onto_existing_values() {
    let mapper = mapper();
    let source: ContentDisplay = mapper.map(&content()).unwrap();
    let mut target = ContentDisplay::default();
    mapper.map_into(&source, &mut target).unwrap();
    assert_eq!(target, source);
}

#[test]
fn map_into_never_synthesizes_collections() {
    let mapper = mapper();
    let sources = vec![ContentSave {
        name: "x".into(),
    }];
    let mut targets: Vec<Content> = Vec::new();
    let err = mapper.map_into(&sources, &mut targets).err().unwrap();
    assert!(matches!(err, MapError::NoMutator { .. }), "{err}");
    assert!(!mapper.has_definition::<Vec<ContentSave>, Vec<Content>>());
}

#[test]
fn map_into_with_prepares_the_context() {
    let mapper = mapper();
    let mut target = ContentDisplay::default();
    let source = content();
    let calls = Cell::new(0);
    mapper
        .map_into_with(
            &ContentDisplay {
                name: source.name.clone(),
                ..ContentDisplay::default()
            },
            &mut target,
            |_| calls.set(calls.get() + 1),
        )
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(target.name, "Home");
}
