//! Configurable custom fields on entity types.
//!
//! Each configured entity gains a `customFields` field holding a generated
//! `<Entity>CustomFields` object, plus matching `Create`/`Update` input
//! types when the entity's mutation inputs exist.

use crate::document::{
    SchemaDocument, find_type, find_type_mut, is_valid_name, parse_generated, push_sdl_block,
    sdl_string,
};
use crate::error::{SchemaError, SchemaResult};
use graphql_parser::schema::{Definition, Field, InputValue, TypeDefinition};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use vendure_types::ApiType;

const CUSTOM_FIELDS_FIELD: &str = "customFields";

/// Value type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    String,
    /// Long-form text. Exposed as `String`.
    Text,
    Int,
    Float,
    Boolean,
    #[serde(rename = "datetime")]
    DateTime,
    /// A reference to another entity type, named by `entity`.
    Relation,
}

impl CustomFieldType {
    fn scalar_name(&self) -> Option<&'static str> {
        match self {
            Self::String | Self::Text => Some("String"),
            Self::Int => Some("Int"),
            Self::Float => Some("Float"),
            Self::Boolean => Some("Boolean"),
            Self::DateTime => Some("DateTime"),
            Self::Relation => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One custom field on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub list: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Exposed on the shop API. Admin always sees non-internal fields.
    #[serde(default = "default_true")]
    pub public: bool,
    /// Readable but never writable through the generated inputs.
    #[serde(default)]
    pub readonly: bool,
    /// Stored but never exposed through any API.
    #[serde(default)]
    pub internal: bool,
    /// Target entity type of a `relation` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CustomFieldConfig {
    fn simple(name: &str, field_type: CustomFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            list: false,
            nullable: true,
            public: true,
            readonly: false,
            internal: false,
            entity: None,
            description: None,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::simple(name, CustomFieldType::String)
    }

    pub fn text(name: &str) -> Self {
        Self::simple(name, CustomFieldType::Text)
    }

    pub fn int(name: &str) -> Self {
        Self::simple(name, CustomFieldType::Int)
    }

    pub fn float(name: &str) -> Self {
        Self::simple(name, CustomFieldType::Float)
    }

    pub fn boolean(name: &str) -> Self {
        Self::simple(name, CustomFieldType::Boolean)
    }

    pub fn datetime(name: &str) -> Self {
        Self::simple(name, CustomFieldType::DateTime)
    }

    /// A reference to an entity of type `entity`.
    pub fn relation(name: &str, entity: &str) -> Self {
        Self {
            entity: Some(entity.into()),
            ..Self::simple(name, CustomFieldType::Relation)
        }
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn visible_on(&self, api_type: ApiType) -> bool {
        !self.internal && (self.public || api_type == ApiType::Admin)
    }
}

/// Custom field configuration for every entity, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFields(IndexMap<String, Vec<CustomFieldConfig>>);

impl CustomFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends fields to an entity's configuration.
    pub fn with_fields(mut self, entity: impl Into<String>, fields: Vec<CustomFieldConfig>) -> Self {
        self.0.entry(entity.into()).or_default().extend(fields);
        self
    }

    /// Parses a TOML table of `[[Entity]]` field arrays.
    pub fn from_toml_str(text: &str) -> SchemaResult<Self> {
        toml::from_str(text)
            .map_err(|e| SchemaError::Config(format!("invalid custom field config: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields(&self, entity: &str) -> &[CustomFieldConfig] {
        self.0.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Adds the configured custom fields visible on `api_type` to a copy of
/// the document.
pub fn add_custom_fields(
    document: &SchemaDocument,
    config: &CustomFields,
    api_type: ApiType,
) -> SchemaResult<SchemaDocument> {
    let mut result = document.clone();
    for (entity, fields) in &config.0 {
        check_names(entity, fields)?;
        let visible: Vec<&CustomFieldConfig> =
            fields.iter().filter(|f| f.visible_on(api_type)).collect();
        if visible.is_empty() {
            continue;
        }
        match find_type(&result, entity) {
            Some(TypeDefinition::Object(_)) => {}
            Some(_) => {
                return Err(custom_field_error(
                    entity,
                    CUSTOM_FIELDS_FIELD,
                    "custom fields can only be added to object types",
                ));
            }
            None => {
                warn!(entity = %entity, api = %api_type, "Custom fields configured for unknown entity, skipping");
                continue;
            }
        }
        inject_entity(&mut result, entity, &visible)?;
        debug!(entity = %entity, api = %api_type, fields = visible.len(), "Added custom fields");
    }
    Ok(result)
}

fn check_names(entity: &str, fields: &[CustomFieldConfig]) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !is_valid_name(&field.name) {
            return Err(custom_field_error(entity, &field.name, "not a valid GraphQL name"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(custom_field_error(entity, &field.name, "declared more than once"));
        }
        if field.field_type == CustomFieldType::Relation && field.entity.is_none() {
            return Err(custom_field_error(entity, &field.name, "relation field without an entity"));
        }
    }
    Ok(())
}

fn inject_entity(
    document: &mut SchemaDocument,
    entity: &str,
    fields: &[&CustomFieldConfig],
) -> SchemaResult<()> {
    let object_name = format!("{entity}CustomFields");
    if let Some(TypeDefinition::Object(obj)) = find_type(document, entity) {
        if obj.fields.iter().any(|f| f.name == CUSTOM_FIELDS_FIELD) {
            return Err(custom_field_error(
                entity,
                CUSTOM_FIELDS_FIELD,
                "the entity already declares a customFields field",
            ));
        }
        if let Some(clash) = fields
            .iter()
            .find(|c| obj.fields.iter().any(|f| f.name == c.name))
        {
            return Err(custom_field_error(
                entity,
                &clash.name,
                "clashes with an existing field of the entity",
            ));
        }
    }
    if find_type(document, &object_name).is_some() {
        return Err(custom_field_error(
            entity,
            CUSTOM_FIELDS_FIELD,
            &format!("type '{object_name}' is already defined"),
        ));
    }

    let mut sdl = String::new();
    if fields.iter().any(|f| f.field_type == CustomFieldType::DateTime)
        && find_type(document, "DateTime").is_none()
    {
        sdl.push_str("scalar DateTime\n");
    }

    let mut members = Vec::new();
    for field in fields {
        let named = match &field.entity {
            Some(target) if field.field_type == CustomFieldType::Relation => {
                if find_type(document, target).is_none() {
                    return Err(custom_field_error(
                        entity,
                        &field.name,
                        &format!("relation target '{target}' is not defined"),
                    ));
                }
                target.as_str()
            }
            _ => field.field_type.scalar_name().unwrap_or("String"),
        };
        if let Some(description) = &field.description {
            members.push(sdl_string(description));
        }
        members.push(format!(
            "{}: {}",
            field.name,
            wrap(named, field.list, !field.nullable)
        ));
    }
    push_sdl_block(&mut sdl, &format!("type {object_name}"), members);

    let writable: Vec<&CustomFieldConfig> =
        fields.iter().copied().filter(|f| !f.readonly).collect();
    let mut input_links = Vec::new();
    if !writable.is_empty() {
        for (prefix, all_nullable) in [("Create", false), ("Update", true)] {
            let input_name = format!("{prefix}{entity}Input");
            if !matches!(find_type(document, &input_name), Some(TypeDefinition::InputObject(_))) {
                continue;
            }
            let fields_input = format!("{prefix}{entity}CustomFieldsInput");
            let members = writable.iter().map(|field| {
                let (name, named) = match field.field_type {
                    CustomFieldType::Relation if field.list => (format!("{}Ids", field.name), "ID"),
                    CustomFieldType::Relation => (format!("{}Id", field.name), "ID"),
                    other => (field.name.clone(), other.scalar_name().unwrap_or("String")),
                };
                let required = !all_nullable && !field.nullable;
                format!("{name}: {}", wrap(named, field.list, required))
            });
            push_sdl_block(&mut sdl, &format!("input {fields_input}"), members);
            input_links.push((input_name, fields_input));
        }
    }

    document.definitions.extend(parse_generated("custom field", &sdl)?);

    let field = generated_field(&format!("{CUSTOM_FIELDS_FIELD}: {object_name}"))?;
    if let Some(TypeDefinition::Object(obj)) = find_type_mut(document, entity) {
        obj.fields.push(field);
    }
    for (input_name, fields_input) in input_links {
        let value = generated_input_value(&format!("{CUSTOM_FIELDS_FIELD}: {fields_input}"))?;
        if let Some(TypeDefinition::InputObject(input)) = find_type_mut(document, &input_name) {
            if input.fields.iter().any(|f| f.name == CUSTOM_FIELDS_FIELD) {
                return Err(custom_field_error(
                    entity,
                    CUSTOM_FIELDS_FIELD,
                    &format!("'{input_name}' already declares a customFields field"),
                ));
            }
            input.fields.push(value);
        }
    }
    Ok(())
}

fn wrap(named: &str, list: bool, required: bool) -> String {
    let inner = if list {
        format!("[{named}!]")
    } else {
        named.to_string()
    };
    if required { format!("{inner}!") } else { inner }
}

fn generated_field(field_sdl: &str) -> SchemaResult<Field<'static, String>> {
    let definitions = parse_generated("custom field", &format!("type Generated {{ {field_sdl} }}"))?;
    definitions
        .into_iter()
        .find_map(|def| match def {
            Definition::TypeDefinition(TypeDefinition::Object(mut obj)) if !obj.fields.is_empty() => {
                Some(obj.fields.remove(0))
            }
            _ => None,
        })
        .ok_or_else(|| SchemaError::Config(format!("could not generate field '{field_sdl}'")))
}

fn generated_input_value(field_sdl: &str) -> SchemaResult<InputValue<'static, String>> {
    let definitions = parse_generated("custom field", &format!("input Generated {{ {field_sdl} }}"))?;
    definitions
        .into_iter()
        .find_map(|def| match def {
            Definition::TypeDefinition(TypeDefinition::InputObject(mut input))
                if !input.fields.is_empty() =>
            {
                Some(input.fields.remove(0))
            }
            _ => None,
        })
        .ok_or_else(|| SchemaError::Config(format!("could not generate input field '{field_sdl}'")))
}

fn custom_field_error(entity: &str, field: &str, reason: &str) -> SchemaError {
    SchemaError::CustomField {
        entity: entity.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
