//! Owned GraphQL schema documents and the helpers every pipeline stage shares.
//!
//! All stages work on `graphql_parser` documents with owned `String` text, so a
//! document can outlive the SDL it was parsed from and be cloned freely between
//! stages. Structural comparison never relies on source positions or
//! descriptions: two definitions are "the same shape" when their canonical
//! signatures (built here) are equal.

use crate::error::{SchemaError, SchemaResult};
use graphql_parser::schema::{
    Definition, Directive, Document, EnumValue, Field, InputValue, Type, TypeDefinition,
    TypeExtension, Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed schema document that owns all of its text.
pub type SchemaDocument = Document<'static, String>;

/// A type reference (`ID`, `[String!]!`, ...) inside a [`SchemaDocument`].
pub type TypeRef = Type<'static, String>;

/// Scalars every GraphQL schema provides without declaring them.
pub const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Who contributed a piece of the merged schema. Used in every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum SchemaSource {
    /// A base type-definition file loaded from the configured type paths.
    Base(String),
    /// A registered plugin, by name.
    Plugin(String),
    /// Resolvers supplied by the core application rather than a plugin.
    Core,
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(path) => write!(f, "base types '{path}'"),
            Self::Plugin(name) => write!(f, "plugin '{name}'"),
            Self::Core => f.write_str("core resolvers"),
        }
    }
}

/// A parsed document together with where it came from.
#[derive(Debug, Clone)]
pub struct SourcedDocument {
    pub source: SchemaSource,
    pub document: SchemaDocument,
}

impl SourcedDocument {
    pub fn new(source: SchemaSource, document: SchemaDocument) -> Self {
        Self { source, document }
    }
}

/// The six kinds of named GraphQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub fn of_definition(def: &TypeDefinition<'static, String>) -> Self {
        match def {
            TypeDefinition::Scalar(_) => Self::Scalar,
            TypeDefinition::Object(_) => Self::Object,
            TypeDefinition::Interface(_) => Self::Interface,
            TypeDefinition::Union(_) => Self::Union,
            TypeDefinition::Enum(_) => Self::Enum,
            TypeDefinition::InputObject(_) => Self::InputObject,
        }
    }

    pub fn of_extension(ext: &TypeExtension<'static, String>) -> Self {
        match ext {
            TypeExtension::Scalar(_) => Self::Scalar,
            TypeExtension::Object(_) => Self::Object,
            TypeExtension::Interface(_) => Self::Interface,
            TypeExtension::Union(_) => Self::Union,
            TypeExtension::Enum(_) => Self::Enum,
            TypeExtension::InputObject(_) => Self::InputObject,
        }
    }

    /// Whether values of this kind may appear in argument and input field positions.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar | Self::Enum | Self::InputObject)
    }

    /// Whether this kind may be returned from a field.
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "a scalar",
            Self::Object => "an object type",
            Self::Interface => "an interface",
            Self::Union => "a union",
            Self::Enum => "an enum",
            Self::InputObject => "an input object",
        })
    }
}

/// Parses SDL into an owned document. Blank input yields an empty document.
pub fn parse_sdl(origin: &str, sdl: &str) -> SchemaResult<SchemaDocument> {
    if sdl.trim().is_empty() {
        return Ok(Document {
            definitions: Vec::new(),
        });
    }
    graphql_parser::parse_schema::<String>(sdl)
        .map(|doc| doc.into_static())
        .map_err(|e| SchemaError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
}

/// Parses SDL produced by the pipeline itself (scalar injection, custom
/// fields, list options).
pub(crate) fn parse_generated(stage: &str, sdl: &str) -> SchemaResult<Vec<Definition<'static, String>>> {
    Ok(parse_sdl(&format!("generated {stage} types"), sdl)?.definitions)
}

/// Prints a document as canonical SDL.
pub fn print_sdl(document: &SchemaDocument) -> String {
    document.to_string()
}

pub fn type_definition_name<'a>(def: &'a TypeDefinition<'static, String>) -> &'a str {
    match def {
        TypeDefinition::Scalar(t) => &t.name,
        TypeDefinition::Object(t) => &t.name,
        TypeDefinition::Interface(t) => &t.name,
        TypeDefinition::Union(t) => &t.name,
        TypeDefinition::Enum(t) => &t.name,
        TypeDefinition::InputObject(t) => &t.name,
    }
}

pub fn type_extension_name<'a>(ext: &'a TypeExtension<'static, String>) -> &'a str {
    match ext {
        TypeExtension::Scalar(t) => &t.name,
        TypeExtension::Object(t) => &t.name,
        TypeExtension::Interface(t) => &t.name,
        TypeExtension::Union(t) => &t.name,
        TypeExtension::Enum(t) => &t.name,
        TypeExtension::InputObject(t) => &t.name,
    }
}

/// Finds a type definition by name.
pub fn find_type<'d>(
    document: &'d SchemaDocument,
    name: &str,
) -> Option<&'d TypeDefinition<'static, String>> {
    document.definitions.iter().find_map(|def| match def {
        Definition::TypeDefinition(td) if type_definition_name(td) == name => Some(td),
        _ => None,
    })
}

/// Finds a type definition by name for in-place editing of a cloned document.
pub fn find_type_mut<'d>(
    document: &'d mut SchemaDocument,
    name: &str,
) -> Option<&'d mut TypeDefinition<'static, String>> {
    document.definitions.iter_mut().find_map(|def| match def {
        Definition::TypeDefinition(td) if type_definition_name(td) == name => Some(td),
        _ => None,
    })
}

/// Name of the root query type (`schema { query: ... }` or `Query`).
pub fn query_type_name(document: &SchemaDocument) -> String {
    root_type_names(document).0
}

/// Root operation type names: query, mutation, subscription.
pub fn root_type_names(document: &SchemaDocument) -> (String, Option<String>, Option<String>) {
    for def in &document.definitions {
        if let Definition::SchemaDefinition(schema) = def {
            return (
                schema.query.clone().unwrap_or_else(|| "Query".to_string()),
                schema.mutation.clone(),
                schema.subscription.clone(),
            );
        }
    }
    let defined = |name: &str| find_type(document, name).map(|_| name.to_string());
    ("Query".to_string(), defined("Mutation"), defined("Subscription"))
}

/// The innermost named type of a reference: `[Product!]!` → `Product`.
pub fn named_type(ty: &TypeRef) -> &str {
    match ty {
        Type::NamedType(name) => name,
        Type::ListType(inner) | Type::NonNullType(inner) => named_type(inner),
    }
}

pub fn is_non_null(ty: &TypeRef) -> bool {
    matches!(ty, Type::NonNullType(_))
}

/// Whether the reference contains a list at any depth.
pub fn is_list(ty: &TypeRef) -> bool {
    match ty {
        Type::NamedType(_) => false,
        Type::ListType(_) => true,
        Type::NonNullType(inner) => is_list(inner),
    }
}

/// Prints a type reference exactly as it appears in SDL.
pub fn type_ref_string(ty: &TypeRef) -> String {
    match ty {
        Type::NamedType(name) => name.clone(),
        Type::ListType(inner) => format!("[{}]", type_ref_string(inner)),
        Type::NonNullType(inner) => format!("{}!", type_ref_string(inner)),
    }
}

/// Prints a constant value as it would appear in SDL.
pub fn value_string(value: &Value<'static, String>) -> String {
    match value {
        Value::Variable(name) => format!("${name}"),
        Value::Int(n) => n.as_i64().map(|n| n.to_string()).unwrap_or_default(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(value_string).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{k}: {}", value_string(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

pub fn directive_signature(directive: &Directive<'static, String>) -> String {
    if directive.arguments.is_empty() {
        return format!("@{}", directive.name);
    }
    let args: Vec<String> = directive
        .arguments
        .iter()
        .map(|(name, value)| format!("{name}: {}", value_string(value)))
        .collect();
    format!("@{}({})", directive.name, args.join(", "))
}

fn directives_signature(directives: &[Directive<'static, String>]) -> String {
    directives
        .iter()
        .map(|d| format!(" {}", directive_signature(d)))
        .collect()
}

/// `name: Type = default`, ignoring directives and descriptions.
pub fn input_value_signature(value: &InputValue<'static, String>) -> String {
    let mut sig = format!("{}: {}", value.name, type_ref_string(&value.value_type));
    if let Some(default) = &value.default_value {
        sig.push_str(" = ");
        sig.push_str(&value_string(default));
    }
    sig
}

/// `name(args): Type`, ignoring directives and descriptions. Two fields with
/// equal signatures are interchangeable for merging purposes.
pub fn field_signature(field: &Field<'static, String>) -> String {
    if field.arguments.is_empty() {
        return format!("{}: {}", field.name, type_ref_string(&field.field_type));
    }
    let args: Vec<String> = field.arguments.iter().map(input_value_signature).collect();
    format!(
        "{}({}): {}",
        field.name,
        args.join(", "),
        type_ref_string(&field.field_type)
    )
}

fn full_field_signature(field: &Field<'static, String>) -> String {
    format!("{}{}", field_signature(field), directives_signature(&field.directives))
}

fn full_input_signature(value: &InputValue<'static, String>) -> String {
    format!(
        "{}{}",
        input_value_signature(value),
        directives_signature(&value.directives)
    )
}

fn enum_value_signature(value: &EnumValue<'static, String>) -> String {
    format!("{}{}", value.name, directives_signature(&value.directives))
}

/// Canonical shape of a type definition: everything except descriptions,
/// source positions and member order. Two definitions that list the same
/// members in a different order have the same shape.
pub fn definition_shape(def: &TypeDefinition<'static, String>) -> String {
    let kind = TypeKind::of_definition(def);
    let (name, directives, mut members): (&str, &[Directive<'static, String>], Vec<String>) = match def {
        TypeDefinition::Scalar(t) => (t.name.as_str(), t.directives.as_slice(), Vec::new()),
        TypeDefinition::Object(t) => {
            let mut members: Vec<String> = t
                .implements_interfaces
                .iter()
                .map(|i| format!("implements {i}"))
                .collect();
            members.extend(t.fields.iter().map(full_field_signature));
            (t.name.as_str(), t.directives.as_slice(), members)
        }
        TypeDefinition::Interface(t) => (
            t.name.as_str(),
            t.directives.as_slice(),
            t.fields.iter().map(full_field_signature).collect(),
        ),
        TypeDefinition::Union(t) => (t.name.as_str(), t.directives.as_slice(), t.types.clone()),
        TypeDefinition::Enum(t) => (
            t.name.as_str(),
            t.directives.as_slice(),
            t.values.iter().map(enum_value_signature).collect(),
        ),
        TypeDefinition::InputObject(t) => (
            t.name.as_str(),
            t.directives.as_slice(),
            t.fields.iter().map(full_input_signature).collect(),
        ),
    };
    members.sort_unstable();
    format!(
        "{kind:?} {name}{} {{ {} }}",
        directives_signature(directives),
        members.join("; ")
    )
}

/// Appends `header { ... }` to generated SDL, one member per line.
pub(crate) fn push_sdl_block<S: AsRef<str>>(
    sdl: &mut String,
    header: &str,
    members: impl IntoIterator<Item = S>,
) {
    sdl.push_str(header);
    sdl.push_str(" {\n");
    for member in members {
        sdl.push_str("  ");
        sdl.push_str(member.as_ref());
        sdl.push('\n');
    }
    sdl.push_str("}\n");
}

/// Escapes text for use inside a generated SDL string literal.
pub(crate) fn sdl_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' | '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `name` is a valid GraphQL name (`/[_A-Za-z][_0-9A-Za-z]*/`).
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_field(sdl: &str) -> Field<'static, String> {
        let doc = parse_sdl("test", sdl).unwrap();
        match doc.definitions.into_iter().next() {
            Some(Definition::TypeDefinition(TypeDefinition::Object(mut obj))) => obj.fields.remove(0),
            other => panic!("expected object type, got {other:?}"),
        }
    }

    #[test]
    fn blank_sdl_is_empty_document() {
        let doc = parse_sdl("blank", "  \n ").unwrap();
        assert!(doc.definitions.is_empty());
    }

    #[test]
    fn parse_error_names_origin() {
        let err = parse_sdl("plugin 'Broken'", "type {").unwrap_err();
        match err {
            SchemaError::Parse { origin, .. } => assert_eq!(origin, "plugin 'Broken'"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn type_ref_printing() {
        let field = first_field("type T { ids: [ID!]! }");
        assert_eq!(type_ref_string(&field.field_type), "[ID!]!");
        assert_eq!(named_type(&field.field_type), "ID");
        assert!(is_list(&field.field_type));
        assert!(is_non_null(&field.field_type));
    }

    #[test]
    fn field_signature_includes_arguments_and_defaults() {
        let field = first_field(r#"type T { search(term: String!, take: Int = 10, mode: Mode = FAST): [Result!] }"#);
        assert_eq!(
            field_signature(&field),
            "search(term: String!, take: Int = 10, mode: Mode = FAST): [Result!]"
        );
    }

    #[test]
    fn field_signature_ignores_descriptions_and_directives() {
        let a = first_field(r#"type T { "docs" foo: String @deprecated }"#);
        let b = first_field("type T { foo: String }");
        assert_eq!(field_signature(&a), field_signature(&b));
    }

    #[test]
    fn shape_ignores_descriptions_but_not_members() {
        let a = parse_sdl("a", r#""Docs" type T { "field docs" a: Int }"#).unwrap();
        let b = parse_sdl("b", "type T { a: Int }").unwrap();
        let c = parse_sdl("c", "type T { a: Int b: Int }").unwrap();
        let shape = |doc: &SchemaDocument| match &doc.definitions[0] {
            Definition::TypeDefinition(td) => definition_shape(td),
            _ => unreachable!(),
        };
        assert_eq!(shape(&a), shape(&b));
        assert_ne!(shape(&a), shape(&c));
    }

    #[test]
    fn generated_block_parses() {
        let mut sdl = String::new();
        push_sdl_block(&mut sdl, "input PageInput", ["skip: Int", "take: Int"]);
        assert_eq!(sdl, "input PageInput {\n  skip: Int\n  take: Int\n}\n");
        assert!(parse_sdl("generated", &sdl).is_ok());
    }

    #[test]
    fn shape_ignores_member_order() {
        let a = parse_sdl("a", "type T implements A & B { a: Int b(x: ID): [String!] }").unwrap();
        let b = parse_sdl("b", "type T implements B & A { b(x: ID): [String!] a: Int }").unwrap();
        let c = parse_sdl("c", "enum E { ON OFF }").unwrap();
        let d = parse_sdl("d", "enum E { OFF ON }").unwrap();
        let shape = |doc: &SchemaDocument| match &doc.definitions[0] {
            Definition::TypeDefinition(td) => definition_shape(td),
            _ => unreachable!(),
        };
        assert_eq!(shape(&a), shape(&b));
        assert_eq!(shape(&c), shape(&d));
    }

    #[test]
    fn root_names_default_to_conventional_types() {
        let doc = parse_sdl("t", "type Query { a: Int } type Mutation { b: Int }").unwrap();
        let (query, mutation, subscription) = root_type_names(&doc);
        assert_eq!(query, "Query");
        assert_eq!(mutation.as_deref(), Some("Mutation"));
        assert_eq!(subscription, None);
    }

    #[test]
    fn root_names_follow_schema_definition() {
        let doc = parse_sdl("t", "schema { query: Root } type Root { a: Int }").unwrap();
        assert_eq!(query_type_name(&doc), "Root");
    }

    #[test]
    fn sdl_string_escapes_quotes() {
        assert_eq!(sdl_string(r#"say "hi"\"#), r#""say \"hi\"\\""#);
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("customFields"));
        assert!(is_valid_name("_internal2"));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("with-dash"));
        assert!(!is_valid_name(""));
    }
}
