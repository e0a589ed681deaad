//! Compact field-type table for client code generation.

use crate::document::{SchemaDocument, TypeRef, is_list, is_non_null, named_type};
use graphql_parser::schema::{Definition, TypeDefinition};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The shape of one field's type reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub type_name: String,
    pub non_null: bool,
    pub is_list: bool,
}

impl FieldInfo {
    fn of(ty: &TypeRef) -> Self {
        Self {
            type_name: named_type(ty).to_string(),
            non_null: is_non_null(ty),
            is_list: is_list(ty),
        }
    }
}

/// `type name -> field name -> field info` for every object, interface and
/// input object type, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaInfo(IndexMap<String, IndexMap<String, FieldInfo>>);

impl SchemaInfo {
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldInfo> {
        self.0.get(type_name)?.get(field_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn schema_info(document: &SchemaDocument) -> SchemaInfo {
    let mut info = IndexMap::new();
    for def in &document.definitions {
        let (name, fields): (&str, IndexMap<String, FieldInfo>) = match def {
            Definition::TypeDefinition(TypeDefinition::Object(t)) => (
                t.name.as_str(),
                t.fields
                    .iter()
                    .map(|f| (f.name.clone(), FieldInfo::of(&f.field_type)))
                    .collect(),
            ),
            Definition::TypeDefinition(TypeDefinition::Interface(t)) => (
                t.name.as_str(),
                t.fields
                    .iter()
                    .map(|f| (f.name.clone(), FieldInfo::of(&f.field_type)))
                    .collect(),
            ),
            Definition::TypeDefinition(TypeDefinition::InputObject(t)) => (
                t.name.as_str(),
                t.fields
                    .iter()
                    .map(|f| (f.name.clone(), FieldInfo::of(&f.value_type)))
                    .collect(),
            ),
            _ => continue,
        };
        info.insert(name.to_string(), fields);
    }
    SchemaInfo(info)
}
