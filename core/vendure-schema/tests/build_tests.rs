use graphql_parser::schema::TypeDefinition;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use vendure_schema::{
    ApiExtension, ApiType, BuildOptions, BuiltSchema, CustomFieldConfig, CustomFields,
    ExecutableSchema, InMemoryTypesLoader, MergeConflict, SchemaConfig, SchemaDocument,
    SchemaError, SchemaOutput, ValidationError, VendurePlugin, api_type_paths, build_schema,
    find_type, resolver_fn, type_ref_string,
};

fn schema_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("schema")
}

fn options(api_type: ApiType) -> BuildOptions {
    BuildOptions::new(api_type).with_type_paths(api_type_paths(&schema_root(), api_type))
}

fn build(config: &SchemaConfig, api_type: ApiType) -> Result<ExecutableSchema, SchemaError> {
    build_schema(config, &options(api_type)).map(|built| match built {
        BuiltSchema::Executable(schema) => schema,
        BuiltSchema::Sdl(_) => panic!("expected an executable schema"),
    })
}

fn build_sdl(config: &SchemaConfig, api_type: ApiType) -> Result<String, SchemaError> {
    build_schema(config, &options(api_type).with_output(SchemaOutput::Sdl)).map(BuiltSchema::into_sdl)
}

fn member_type(doc: &SchemaDocument, type_name: &str, member: &str) -> Option<String> {
    match find_type(doc, type_name)? {
        TypeDefinition::Object(t) => t
            .fields
            .iter()
            .find(|f| f.name == member)
            .map(|f| type_ref_string(&f.field_type)),
        TypeDefinition::InputObject(t) => t
            .fields
            .iter()
            .find(|f| f.name == member)
            .map(|f| type_ref_string(&f.value_type)),
        _ => None,
    }
}

fn plugin(name: &str, admin: Option<&str>, shop: Option<&str>) -> VendurePlugin {
    let mut builder = VendurePlugin::builder(name);
    if let Some(sdl) = admin {
        builder = builder.admin_api_extensions(ApiExtension::new().schema(sdl));
    }
    if let Some(sdl) = shop {
        builder = builder.shop_api_extensions(ApiExtension::new().schema(sdl));
    }
    builder.build().unwrap()
}

fn validation_errors(result: Result<String, SchemaError>) -> Vec<ValidationError> {
    match result {
        Err(SchemaError::Validation(errors)) => errors.into_vec(),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

// ── Bundled schema ───────────────────────────────────────────────

#[test]
fn bundled_schema_builds_for_both_apis() {
    let config = SchemaConfig::new();
    for api_type in ApiType::ALL {
        let sdl = build_sdl(&config, api_type).unwrap();
        assert!(sdl.contains("input ProductListOptions"), "{api_type}: {sdl}");
        assert!(!sdl.contains("vendureRemove"), "{api_type}: {sdl}");
    }
}

#[test]
fn admin_and_shop_have_independent_queries() {
    let config = SchemaConfig::new();
    let admin = build(&config, ApiType::Admin).unwrap();
    let shop = build(&config, ApiType::Shop).unwrap();

    assert!(admin.field("Query", "customers").is_some());
    assert!(shop.field("Query", "customers").is_none());
    assert!(shop.field("Query", "activeCustomer").is_some());
    assert_eq!(admin.api_type(), ApiType::Admin);
}

#[test]
fn sdl_output_matches_executable_sdl() {
    let config = SchemaConfig::new();
    let sdl = build_sdl(&config, ApiType::Shop).unwrap();
    let executable = build(&config, ApiType::Shop).unwrap();
    assert_eq!(sdl, executable.sdl());
}

#[test]
fn list_options_are_generated_from_item_fields() {
    let schema = build(&SchemaConfig::new(), ApiType::Admin).unwrap();
    let doc = schema.document();
    assert_eq!(
        member_type(doc, "ProductSortParameter", "price").as_deref(),
        Some("SortOrder")
    );
    assert_eq!(member_type(doc, "ProductSortParameter", "enabled"), None);
    assert_eq!(
        member_type(doc, "ProductFilterParameter", "enabled").as_deref(),
        Some("BooleanOperators")
    );
    assert_eq!(
        member_type(doc, "CustomerListOptions", "filterOperator").as_deref(),
        Some("LogicalOperator")
    );
}

// ── Determinism ──────────────────────────────────────────────────

#[test]
fn same_plugins_build_identical_sdl() {
    let config = SchemaConfig::new()
        .with_plugin(plugin(
            "Reviews",
            Some("type ProductReview { id: ID! rating: Int! } extend type Product { reviews: [ProductReview!]! }"),
            None,
        ))
        .with_plugin(plugin("Loyalty", Some("extend type Customer { points: Int }"), None));
    let first = build_sdl(&config, ApiType::Admin).unwrap();
    let second = build_sdl(&config, ApiType::Admin).unwrap();
    assert_eq!(first, second);
}

#[test]
fn concurrent_builds_match_serial_builds() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "Both",
        Some("extend type Product { adminNote: String }"),
        Some("extend type Product { shopNote: String }"),
    ));
    let serial_admin = build_sdl(&config, ApiType::Admin).unwrap();
    let serial_shop = build_sdl(&config, ApiType::Shop).unwrap();

    let (admin, shop) = std::thread::scope(|scope| {
        let admin = scope.spawn(|| build_sdl(&config, ApiType::Admin));
        let shop = scope.spawn(|| build_sdl(&config, ApiType::Shop));
        (admin.join().unwrap(), shop.join().unwrap())
    });
    assert_eq!(admin.unwrap(), serial_admin);
    assert_eq!(shop.unwrap(), serial_shop);
    assert!(serial_admin.contains("adminNote") && !serial_admin.contains("shopNote"));
}

// ── Directives through the pipeline ──────────────────────────────

#[test]
fn admin_directive_does_not_touch_shop_copy() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "RelaxDescription",
        Some("extend type Product { description: String! @vendureMakeNullable }"),
        None,
    ));
    let admin = build(&config, ApiType::Admin).unwrap();
    let shop = build(&config, ApiType::Shop).unwrap();
    assert_eq!(
        member_type(admin.document(), "Product", "description").as_deref(),
        Some("String")
    );
    assert_eq!(
        member_type(shop.document(), "Product", "description").as_deref(),
        Some("String!")
    );
}

#[test]
fn removed_input_field_is_not_exposed() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "NoSlugEdits",
        Some("extend input UpdateProductInput { slug: String @vendureRemove }"),
        None,
    ));
    let admin = build(&config, ApiType::Admin).unwrap();
    assert_eq!(member_type(admin.document(), "UpdateProductInput", "slug"), None);
    assert!(member_type(admin.document(), "UpdateProductInput", "name").is_some());
}

#[test]
fn removed_fields_are_not_sortable() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "HideAsset",
        Some("extend type Product { featuredAssetId: ID @vendureRemove }"),
        None,
    ));
    let admin = build(&config, ApiType::Admin).unwrap();
    let doc = admin.document();
    assert_eq!(member_type(doc, "Product", "featuredAssetId"), None);
    assert_eq!(member_type(doc, "ProductSortParameter", "featuredAssetId"), None);
    assert!(member_type(doc, "ProductSortParameter", "id").is_some());
}

#[test]
fn marker_on_unknown_field_fails_the_build() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "Typo",
        Some("extend type Product { nmae: String @vendureRemove }"),
        None,
    ));
    assert!(matches!(
        build_sdl(&config, ApiType::Admin),
        Err(SchemaError::DirectiveMisuse { .. })
    ));
}

// ── Merge conflicts through the pipeline ─────────────────────────

#[test]
fn identical_plugin_fields_build_once() {
    let config = SchemaConfig::new()
        .with_plugin(plugin("A", Some("extend type Product { foo: String }"), None))
        .with_plugin(plugin("B", Some("extend type Product { foo: String }"), None));
    let admin = build(&config, ApiType::Admin).unwrap();
    let Some(TypeDefinition::Object(product)) = admin.type_definition("Product") else {
        panic!("Product missing");
    };
    assert_eq!(product.fields.iter().filter(|f| f.name == "foo").count(), 1);
}

#[test]
fn conflicting_plugin_fields_fail_the_build() {
    let config = SchemaConfig::new()
        .with_plugin(plugin("A", Some("extend type Product { foo: String }"), None))
        .with_plugin(plugin("B", Some("extend type Product { foo: Int }"), None));
    assert!(matches!(
        build_sdl(&config, ApiType::Admin),
        Err(SchemaError::MergeConflict(MergeConflict::Field { .. }))
    ));
    // The shop build never sees either extension.
    assert!(build_sdl(&config, ApiType::Shop).is_ok());
}

#[test]
fn duplicate_plugin_names_are_rejected() {
    let config = SchemaConfig::new()
        .with_plugin(plugin("Same", None, None))
        .with_plugin(plugin("Same", None, None));
    assert!(matches!(
        build_sdl(&config, ApiType::Admin),
        Err(SchemaError::Config(_))
    ));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn all_validation_errors_are_reported_together() {
    let config = SchemaConfig::new().with_plugin(plugin(
        "Dangling",
        Some("extend type Product { reviews: [Review!]! supplier: Supplier }"),
        None,
    ));
    let errors = validation_errors(build_sdl(&config, ApiType::Admin));
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors
        .iter()
        .all(|e| matches!(e, ValidationError::UnknownType { .. })));
}

#[test]
fn resolver_for_missing_field_is_reported() {
    let config = SchemaConfig::new().with_plugin(
        VendurePlugin::builder("Ghost")
            .admin_api_extensions(ApiExtension::new().resolver(
                "Product",
                "ghost",
                resolver_fn(|_| Ok(serde_json::Value::Null)),
            ))
            .build()
            .unwrap(),
    );
    let errors = validation_errors(build_sdl(&config, ApiType::Admin));
    assert!(matches!(
        errors.as_slice(),
        [ValidationError::ResolverWithoutField { field_name, .. }] if field_name == "ghost"
    ));
}

#[test]
fn missing_base_types_fail_validation() {
    let options = BuildOptions::new(ApiType::Shop)
        .with_loader(InMemoryTypesLoader::new())
        .with_output(SchemaOutput::Sdl);
    match build_schema(&SchemaConfig::new(), &options) {
        Err(SchemaError::Validation(errors)) => assert!(errors
            .errors()
            .iter()
            .any(|e| matches!(e, ValidationError::MissingRootType { .. }))),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

// ── Scalars and custom fields ────────────────────────────────────

#[test]
fn extension_scalars_are_declared() {
    let config = SchemaConfig::new().with_plugin(
        VendurePlugin::builder("Uploads")
            .admin_api_extensions(
                ApiExtension::new()
                    .scalar("Upload")
                    .scalar("DateTime")
                    .schema("extend type Mutation { uploadAsset(file: Upload!): ID }"),
            )
            .build()
            .unwrap(),
    );
    let sdl = build_sdl(&config, ApiType::Admin).unwrap();
    assert_eq!(sdl.matches("scalar Upload").count(), 1, "{sdl}");
    assert_eq!(sdl.matches("scalar DateTime").count(), 1, "{sdl}");
}

fn custom_fields() -> CustomFields {
    CustomFields::new().with_fields(
        "Product",
        vec![
            CustomFieldConfig::string("infoUrl").description("Manufacturer page"),
            CustomFieldConfig::float("weight").private(),
            CustomFieldConfig::int("syncVersion").internal(),
            CustomFieldConfig::datetime("reviewedAt").readonly(),
            CustomFieldConfig::relation("owner", "Customer"),
            CustomFieldConfig::string("tags").list().non_nullable(),
        ],
    )
}

#[test]
fn admin_custom_fields_include_private_but_not_internal() {
    let config = SchemaConfig::new().with_custom_fields(custom_fields());
    let admin = build(&config, ApiType::Admin).unwrap();
    let doc = admin.document();

    assert_eq!(
        member_type(doc, "Product", "customFields").as_deref(),
        Some("ProductCustomFields")
    );
    assert_eq!(member_type(doc, "ProductCustomFields", "weight").as_deref(), Some("Float"));
    assert_eq!(member_type(doc, "ProductCustomFields", "owner").as_deref(), Some("Customer"));
    assert_eq!(member_type(doc, "ProductCustomFields", "tags").as_deref(), Some("[String!]!"));
    assert_eq!(member_type(doc, "ProductCustomFields", "syncVersion"), None);

    assert_eq!(
        member_type(doc, "CreateProductCustomFieldsInput", "ownerId").as_deref(),
        Some("ID")
    );
    assert_eq!(
        member_type(doc, "CreateProductCustomFieldsInput", "tags").as_deref(),
        Some("[String!]!")
    );
    assert_eq!(member_type(doc, "CreateProductCustomFieldsInput", "reviewedAt"), None);
    assert_eq!(
        member_type(doc, "UpdateProductCustomFieldsInput", "tags").as_deref(),
        Some("[String!]")
    );
    assert_eq!(
        member_type(doc, "UpdateProductInput", "customFields").as_deref(),
        Some("UpdateProductCustomFieldsInput")
    );
}

#[test]
fn shop_custom_fields_omit_private_fields() {
    let config = SchemaConfig::new().with_custom_fields(custom_fields());
    let shop = build(&config, ApiType::Shop).unwrap();
    let doc = shop.document();
    assert!(member_type(doc, "ProductCustomFields", "infoUrl").is_some());
    assert_eq!(member_type(doc, "ProductCustomFields", "weight"), None);
    assert!(find_type(doc, "CreateProductCustomFieldsInput").is_none());
}

#[test]
fn duplicate_custom_field_fails_the_build() {
    let config = SchemaConfig::new().with_custom_fields(CustomFields::new().with_fields(
        "Customer",
        vec![CustomFieldConfig::string("nickname"), CustomFieldConfig::int("nickname")],
    ));
    assert!(matches!(
        build_sdl(&config, ApiType::Shop),
        Err(SchemaError::CustomField { .. })
    ));
}

#[test]
fn custom_field_clashing_with_entity_field_fails() {
    let config = SchemaConfig::new().with_custom_fields(
        CustomFields::new().with_fields("Customer", vec![CustomFieldConfig::string("firstName")]),
    );
    assert!(matches!(
        build_sdl(&config, ApiType::Admin),
        Err(SchemaError::CustomField { .. })
    ));
}

// ── File loading ─────────────────────────────────────────────────

#[test]
fn file_loader_reads_nested_sdl_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let common = dir.path().join("common");
    let admin = dir.path().join("admin-api").join("nested");
    std::fs::create_dir_all(&common).unwrap();
    std::fs::create_dir_all(&admin).unwrap();
    std::fs::write(common.join("b.graphql"), "type Query { ping: String }").unwrap();
    std::fs::write(common.join("a.gql"), "scalar DateTime").unwrap();
    std::fs::write(common.join("notes.txt"), "not sdl").unwrap();
    std::fs::write(admin.join("extra.graphql"), "extend type Query { now: DateTime }").unwrap();

    let options = BuildOptions::new(ApiType::Admin)
        .with_type_paths(api_type_paths(dir.path(), ApiType::Admin))
        .with_output(SchemaOutput::Sdl);
    let sdl = build_schema(&SchemaConfig::new(), &options).unwrap().into_sdl();
    assert!(sdl.find("scalar DateTime") < sdl.find("type Query"), "{sdl}");
    assert!(sdl.contains("now: DateTime"), "{sdl}");
}

#[test]
fn missing_type_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = BuildOptions::new(ApiType::Admin)
        .with_type_paths([dir.path().join("does-not-exist")]);
    assert!(matches!(
        build_schema(&SchemaConfig::new(), &options),
        Err(SchemaError::Io { .. })
    ));
}
