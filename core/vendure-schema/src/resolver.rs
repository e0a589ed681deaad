//! Field resolvers contributed alongside type definitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifies the field a resolver serves: `(type name, field name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolverKey {
    pub type_name: String,
    pub field_name: String,
}

impl ResolverKey {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }
}

impl fmt::Display for ResolverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Everything a resolver sees when it is invoked.
#[derive(Debug, Clone, Copy)]
pub struct ResolverContext<'a> {
    pub type_name: &'a str,
    pub field_name: &'a str,
    /// The already-resolved parent object (`null` for root fields).
    pub parent: &'a Value,
    pub args: &'a Map<String, Value>,
}

impl ResolverContext<'_> {
    /// Looks up a single argument by name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Resolves the value of one field.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> anyhow::Result<Value>;
}

/// Adapts a synchronous closure into a [`FieldResolver`].
pub struct FnResolver<F>(F);

/// Wraps a closure as a resolver:
///
/// ```
/// use vendure_schema::resolver_fn;
/// let resolver = resolver_fn(|_ctx| Ok(serde_json::json!("hello")));
/// # let _ = resolver;
/// ```
pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&ResolverContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    FnResolver(f)
}

#[async_trait]
impl<F> FieldResolver for FnResolver<F>
where
    F: Fn(&ResolverContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    async fn resolve(&self, ctx: ResolverContext<'_>) -> anyhow::Result<Value> {
        (self.0)(&ctx)
    }
}

/// Resolvers keyed by field. Ordered so iteration is deterministic.
pub type ResolverMap = BTreeMap<ResolverKey, Arc<dyn FieldResolver>>;

/// A resolver selected for a build, with the contributor that supplied it.
#[derive(Clone)]
pub struct RegisteredResolver {
    pub origin: crate::document::SchemaSource,
    pub resolver: Arc<dyn FieldResolver>,
}

impl fmt::Debug for RegisteredResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredResolver")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// The resolvers of one build: exactly one per field.
pub type MergedResolvers = BTreeMap<ResolverKey, RegisteredResolver>;
