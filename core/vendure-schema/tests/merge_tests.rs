use pretty_assertions::assert_eq;
use serde_json::json;
use vendure_schema::{
    ApiExtension, ApiType, MergeConflict, SchemaError, SchemaSource, SourcedDocument,
    VendurePlugin, collect_extensions, merge_documents, merge_resolvers, parse_sdl, print_sdl,
    resolver_fn, ResolverKey, ResolverMap,
};
use std::sync::Arc;

const BASE: &str = "type Query { product: Product } type Product { id: ID! name: String! }";

fn base() -> Vec<SourcedDocument> {
    vec![SourcedDocument::new(
        SchemaSource::Base("catalog.graphql".into()),
        parse_sdl("catalog.graphql", BASE).unwrap(),
    )]
}

fn admin_plugin(name: &str, sdl: &str) -> VendurePlugin {
    VendurePlugin::builder(name)
        .admin_api_extensions(ApiExtension::new().schema(sdl))
        .build()
        .unwrap()
}

fn merge_admin(plugins: &[VendurePlugin]) -> Result<String, SchemaError> {
    let extensions = collect_extensions(plugins, ApiType::Admin);
    merge_documents(&base(), &extensions).map(|merged| print_sdl(merged.document()))
}

// ── Collection ───────────────────────────────────────────────────

#[test]
fn collector_filters_by_api_and_keeps_registration_order() {
    let plugins = vec![
        VendurePlugin::builder("Reviews")
            .shop_api_extensions(ApiExtension::new().schema("extend type Product { rating: Float }"))
            .admin_api_extensions(ApiExtension::new().schema("extend type Product { reviewCount: Int }"))
            .build()
            .unwrap(),
        VendurePlugin::builder("Silent").build().unwrap(),
        VendurePlugin::builder("Wishlist")
            .api_extensions(ApiExtension::new().schema("type Wishlist { id: ID! }"))
            .build()
            .unwrap(),
    ];

    let admin: Vec<String> = collect_extensions(&plugins, ApiType::Admin)
        .iter()
        .map(|c| c.plugin.clone())
        .collect();
    assert_eq!(admin, vec!["Reviews", "Wishlist"]);

    let shop = collect_extensions(&plugins, ApiType::Shop);
    assert_eq!(shop.len(), 2);
    assert_eq!(shop[0].source(), SchemaSource::Plugin("Reviews".into()));
}

#[test]
fn empty_plugin_name_is_rejected() {
    let err = VendurePlugin::builder("  ").build().unwrap_err();
    assert!(matches!(err, SchemaError::Config(_)));
}

#[test]
fn extension_parse_error_names_plugin() {
    let err = VendurePlugin::builder("Broken")
        .admin_api_extensions(ApiExtension::new().schema("type {"))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("plugin 'Broken'"), "{err}");
}

// ── Field merging ────────────────────────────────────────────────

#[test]
fn identical_field_from_two_plugins_is_merged_once() {
    let sdl = merge_admin(&[
        admin_plugin("A", "extend type Product { foo: String }"),
        admin_plugin("B", "extend type Product { foo: String }"),
    ])
    .unwrap();
    assert_eq!(sdl.matches("foo: String").count(), 1, "{sdl}");
}

#[test]
fn conflicting_field_types_fail_naming_both_plugins() {
    let err = merge_admin(&[
        admin_plugin("A", "extend type Product { foo: String }"),
        admin_plugin("B", "extend type Product { foo: Int }"),
    ])
    .unwrap_err();

    match &err {
        SchemaError::MergeConflict(MergeConflict::Field {
            type_name,
            field_name,
            first,
            second,
            ..
        }) => {
            assert_eq!(type_name, "Product");
            assert_eq!(field_name, "foo");
            assert_eq!(first, &SchemaSource::Plugin("A".into()));
            assert_eq!(second, &SchemaSource::Plugin("B".into()));
        }
        other => panic!("expected field conflict, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("plugin 'A'") && message.contains("plugin 'B'"), "{message}");
}

#[test]
fn nullability_difference_is_a_conflict() {
    let err = merge_admin(&[admin_plugin("A", "extend type Product { name: String }")]).unwrap_err();
    match err {
        SchemaError::MergeConflict(MergeConflict::Field { first, .. }) => {
            assert_eq!(first, SchemaSource::Base("catalog.graphql".into()));
        }
        other => panic!("expected field conflict, got {other:?}"),
    }
}

#[test]
fn argument_difference_is_a_conflict() {
    let err = merge_admin(&[
        admin_plugin("A", "extend type Query { search(term: String): [Product!]! }"),
        admin_plugin("B", "extend type Query { search(term: String!): [Product!]! }"),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::MergeConflict(MergeConflict::Field { .. })
    ));
}

#[test]
fn input_fields_merge_by_type_and_default() {
    let sdl = merge_admin(&[
        admin_plugin("A", "input Filter { take: Int = 10 }"),
        admin_plugin("B", "extend input Filter { take: Int = 10 skip: Int }"),
    ])
    .unwrap();
    assert!(sdl.contains("skip: Int"), "{sdl}");

    let err = merge_admin(&[
        admin_plugin("A", "input Filter { take: Int = 10 }"),
        admin_plugin("B", "extend input Filter { take: Int = 20 }"),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::MergeConflict(MergeConflict::Field { .. })
    ));
}

// ── Type merging ─────────────────────────────────────────────────

#[test]
fn identical_new_types_are_deduplicated() {
    let sdl = merge_admin(&[
        admin_plugin("A", "\"Docs from A\" type Review { id: ID! body: String }"),
        admin_plugin("B", "type Review { id: ID! body: String }"),
    ])
    .unwrap();
    assert_eq!(sdl.matches("type Review").count(), 1, "{sdl}");
}

#[test]
fn same_type_with_reordered_fields_is_deduplicated() {
    let sdl = merge_admin(&[
        admin_plugin("A", "type Review { id: ID! body: String }"),
        admin_plugin("B", "type Review { body: String id: ID! }"),
    ])
    .unwrap();
    assert_eq!(sdl.matches("type Review").count(), 1, "{sdl}");
    // The first contributor's member order is kept.
    let review = &sdl[sdl.find("type Review").unwrap()..];
    assert!(review.find("id: ID!").unwrap() < review.find("body: String").unwrap(), "{sdl}");
}

#[test]
fn different_new_types_conflict() {
    let err = merge_admin(&[
        admin_plugin("A", "type Review { id: ID! body: String }"),
        admin_plugin("B", "type Review { id: ID! rating: Int }"),
    ])
    .unwrap_err();
    match err {
        SchemaError::MergeConflict(MergeConflict::TypeShape { first, second, .. }) => {
            assert_eq!(first, SchemaSource::Plugin("A".into()));
            assert_eq!(second, SchemaSource::Plugin("B".into()));
        }
        other => panic!("expected shape conflict, got {other:?}"),
    }
}

#[test]
fn plugin_may_extend_type_defined_by_later_plugin() {
    let sdl = merge_admin(&[
        admin_plugin("A", "extend type Review { helpful: Int }"),
        admin_plugin("B", "type Review { id: ID! }"),
    ])
    .unwrap();
    assert!(sdl.contains("helpful: Int"), "{sdl}");
}

#[test]
fn extending_unknown_type_fails() {
    let err = merge_admin(&[admin_plugin("A", "extend type Missing { x: Int }")]).unwrap_err();
    assert!(err.to_string().contains("plugin 'A'"), "{err}");
}

#[test]
fn merged_output_follows_registration_order() {
    let plugins = [
        admin_plugin("A", "type Alpha { id: ID! } extend type Product { a: Int }"),
        admin_plugin("B", "type Beta { id: ID! } extend type Product { b: Int }"),
    ];
    let extensions = collect_extensions(&plugins, ApiType::Admin);
    let merged = merge_documents(&base(), &extensions).unwrap();
    let names: Vec<&str> = merged.type_names().collect();
    assert_eq!(names, vec!["Query", "Product", "Alpha", "Beta"]);
    assert_eq!(merged.defined_by("Beta"), Some(&SchemaSource::Plugin("B".into())));

    let sdl = print_sdl(merged.document());
    assert!(sdl.find("a: Int") < sdl.find("b: Int"));
}

// ── Resolvers ────────────────────────────────────────────────────

#[test]
fn resolver_conflict_names_both_plugins() {
    let plugins = [
        VendurePlugin::builder("A")
            .admin_api_extensions(
                ApiExtension::new().resolver("Product", "rating", resolver_fn(|_| Ok(json!(1)))),
            )
            .build()
            .unwrap(),
        VendurePlugin::builder("B")
            .admin_api_extensions(
                ApiExtension::new().resolver("Product", "rating", resolver_fn(|_| Ok(json!(2)))),
            )
            .build()
            .unwrap(),
    ];
    let extensions = collect_extensions(&plugins, ApiType::Admin);
    let err = merge_resolvers(&ResolverMap::new(), &extensions).unwrap_err();
    match err {
        SchemaError::ResolverConflict { first, second, .. } => {
            assert_eq!(first, SchemaSource::Plugin("A".into()));
            assert_eq!(second, SchemaSource::Plugin("B".into()));
        }
        other => panic!("expected resolver conflict, got {other:?}"),
    }
}

#[test]
fn plugin_resolver_cannot_replace_core_resolver() {
    let mut core = ResolverMap::new();
    core.insert(
        ResolverKey::new("Query", "product"),
        Arc::new(resolver_fn(|_| Ok(json!(null)))),
    );
    let plugins = [VendurePlugin::builder("Override")
        .admin_api_extensions(
            ApiExtension::new().resolver("Query", "product", resolver_fn(|_| Ok(json!(null)))),
        )
        .build()
        .unwrap()];
    let extensions = collect_extensions(&plugins, ApiType::Admin);
    let err = merge_resolvers(&core, &extensions).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::ResolverConflict { first: SchemaSource::Core, .. }
    ));
}

#[test]
fn resolvers_from_both_surfaces_do_not_collide() {
    let plugins = [VendurePlugin::builder("Split")
        .admin_api_extensions(
            ApiExtension::new().resolver("Product", "stock", resolver_fn(|_| Ok(json!(5)))),
        )
        .shop_api_extensions(
            ApiExtension::new().resolver("Product", "stock", resolver_fn(|_| Ok(json!("in stock")))),
        )
        .build()
        .unwrap()];
    for api in ApiType::ALL {
        let extensions = collect_extensions(&plugins, api);
        let merged = merge_resolvers(&ResolverMap::new(), &extensions).unwrap();
        assert_eq!(merged.len(), 1);
    }
}
