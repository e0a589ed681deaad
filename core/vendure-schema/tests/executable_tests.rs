use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use std::path::Path;
use vendure_schema::{
    ApiExtension, ApiType, BuildOptions, ExecutableSchema, FieldInfo, ResolveError, SchemaConfig,
    SchemaSource, VendurePlugin, api_type_paths, build_schema, resolver_fn, schema_info,
};

fn build(config: &SchemaConfig) -> ExecutableSchema {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("schema");
    let options =
        BuildOptions::new(ApiType::Admin).with_type_paths(api_type_paths(&root, ApiType::Admin));
    build_schema(config, &options)
        .unwrap()
        .into_executable()
        .expect("executable output")
}

fn config() -> SchemaConfig {
    SchemaConfig::new()
        .with_resolver(
            "Query",
            "product",
            resolver_fn(|ctx| {
                let id = ctx.arg("id").cloned().unwrap_or(Value::Null);
                Ok(json!({ "id": id, "name": "Laptop", "slug": "laptop" }))
            }),
        )
        .with_plugin(
            VendurePlugin::builder("Stock")
                .admin_api_extensions(
                    ApiExtension::new()
                        .schema("extend type Product { stockLevel: Int! }")
                        .resolver(
                            "Product",
                            "stockLevel",
                            resolver_fn(|ctx| {
                                match ctx.parent.get("slug").and_then(Value::as_str) {
                                    Some("laptop") => Ok(json!(12)),
                                    Some(other) => anyhow::bail!("no stock record for '{other}'"),
                                    None => Ok(Value::Null),
                                }
                            }),
                        ),
                )
                .build()
                .unwrap(),
        )
}

#[tokio::test]
async fn root_field_uses_registered_resolver() {
    let schema = build(&config());
    let mut args = Map::new();
    args.insert("id".into(), json!("42"));

    let product = schema
        .resolve_field("Query", "product", &Value::Null, &args)
        .await
        .unwrap();
    assert_eq!(product["id"], json!("42"));
}

#[tokio::test]
async fn fields_without_resolver_read_parent_property() {
    let schema = build(&config());
    let parent = json!({ "id": "1", "name": "Laptop" });
    let name = schema
        .resolve_field("Product", "name", &parent, &Map::new())
        .await
        .unwrap();
    assert_eq!(name, json!("Laptop"));
}

#[tokio::test]
async fn plugin_resolver_sees_parent() {
    let schema = build(&config());
    let stock = schema
        .resolve_field("Product", "stockLevel", &json!({ "slug": "laptop" }), &Map::new())
        .await
        .unwrap();
    assert_eq!(stock, json!(12));
}

#[tokio::test]
async fn resolver_errors_are_reported_with_field() {
    let schema = build(&config());
    let err = schema
        .resolve_field("Product", "stockLevel", &json!({ "slug": "phone" }), &Map::new())
        .await
        .unwrap_err();
    match err {
        ResolveError::Resolver { key, message } => {
            assert_eq!(key.to_string(), "Product.stockLevel");
            assert!(message.contains("phone"), "{message}");
        }
        other => panic!("expected resolver error, got {other:?}"),
    }
}

#[tokio::test]
async fn null_for_non_null_field_is_an_error() {
    let schema = build(&config());
    let err = schema
        .resolve_field("Product", "name", &json!({}), &Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NullForNonNull { .. }));

    let asset = schema
        .resolve_field("Product", "featuredAssetId", &json!({}), &Map::new())
        .await
        .unwrap();
    assert_eq!(asset, Value::Null);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let schema = build(&config());
    let err = schema
        .resolve_field("Product", "nope", &json!({}), &Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnknownField { .. }));
}

#[test]
fn resolver_origins_are_tracked() {
    let schema = build(&config());
    assert_eq!(schema.resolver_origin("Query", "product"), Some(&SchemaSource::Core));
    assert_eq!(
        schema.resolver_origin("Product", "stockLevel"),
        Some(&SchemaSource::Plugin("Stock".into()))
    );
    assert_eq!(schema.resolver_origin("Product", "name"), None);
    assert_eq!(schema.resolver_keys().count(), 2);
    assert_eq!(schema.query_type(), "Query");
}

#[test]
fn schema_info_describes_field_types() {
    let schema = build(&config());
    let info = schema_info(schema.document());

    assert_eq!(
        info.field("Product", "id"),
        Some(&FieldInfo {
            type_name: "ID".into(),
            non_null: true,
            is_list: false,
        })
    );
    assert_eq!(
        info.field("ProductList", "items").map(|f| f.is_list),
        Some(true)
    );
    assert!(info.field("SortOrder", "ASC").is_none());

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["Product"]["stockLevel"]["type_name"], json!("Int"));
}
