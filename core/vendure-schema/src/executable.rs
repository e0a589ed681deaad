//! A built schema with its resolvers attached.

use crate::document::{SchemaDocument, SchemaSource, find_type, is_non_null, query_type_name};
use crate::error::ResolveError;
use crate::resolver::{MergedResolvers, ResolverContext, ResolverKey};
use graphql_parser::schema::{Field, TypeDefinition};
use serde_json::{Map, Value};
use tracing::debug;
use vendure_types::ApiType;

/// The validated document, its printed SDL and one resolver per field that
/// needs one. Fields without a resolver read the same-named property of
/// their parent value.
#[derive(Debug, Clone)]
pub struct ExecutableSchema {
    api_type: ApiType,
    document: SchemaDocument,
    sdl: String,
    resolvers: MergedResolvers,
}

impl ExecutableSchema {
    pub(crate) fn new(
        api_type: ApiType,
        document: SchemaDocument,
        sdl: String,
        resolvers: MergedResolvers,
    ) -> Self {
        Self {
            api_type,
            document,
            sdl,
            resolvers,
        }
    }

    pub fn api_type(&self) -> ApiType {
        self.api_type
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn query_type(&self) -> String {
        query_type_name(&self.document)
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition<'static, String>> {
        find_type(&self.document, name)
    }

    /// Looks up a field of an object or interface type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&Field<'static, String>> {
        let fields = match self.type_definition(type_name)? {
            TypeDefinition::Object(obj) => &obj.fields,
            TypeDefinition::Interface(iface) => &iface.fields,
            _ => return None,
        };
        fields.iter().find(|f| f.name == field_name)
    }

    /// Which contributor supplied the resolver for a field, if any.
    pub fn resolver_origin(&self, type_name: &str, field_name: &str) -> Option<&SchemaSource> {
        self.resolvers
            .get(&ResolverKey::new(type_name, field_name))
            .map(|registered| &registered.origin)
    }

    pub fn resolver_keys(&self) -> impl Iterator<Item = &ResolverKey> {
        self.resolvers.keys()
    }

    /// Produces the value of one field for `parent`.
    pub async fn resolve_field(
        &self,
        type_name: &str,
        field_name: &str,
        parent: &Value,
        args: &Map<String, Value>,
    ) -> Result<Value, ResolveError> {
        let Some(field) = self.field(type_name, field_name) else {
            return Err(ResolveError::UnknownField {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            });
        };
        let key = ResolverKey::new(type_name, field_name);

        let value = match self.resolvers.get(&key) {
            Some(registered) => {
                let ctx = ResolverContext {
                    type_name,
                    field_name,
                    parent,
                    args,
                };
                registered.resolver.resolve(ctx).await.map_err(|e| {
                    debug!(field = %key, origin = %registered.origin, error = %e, "Resolver failed");
                    ResolveError::Resolver {
                        key: key.clone(),
                        message: format!("{e:#}"),
                    }
                })?
            }
            None => parent.get(field_name).cloned().unwrap_or(Value::Null),
        };

        if value.is_null() && is_non_null(&field.field_type) {
            return Err(ResolveError::NullForNonNull { key });
        }
        Ok(value)
    }
}
