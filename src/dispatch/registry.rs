//! Method registry and per-request lookup
//!
//! Handlers are collected through a [`RegistryBuilder`] during startup and frozen into an
//! immutable [`MethodRegistry`] before the transport accepts requests. Lookup is total:
//! names without a handler resolve to the missing-method descriptor, which answers every
//! invocation with [`AppError::UnknownMethod`].

use std::{
    borrow::Borrow,
    collections::{hash_map::Entry, HashMap},
    fmt,
    future::Future,
    sync::Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{dispatch::tracker::ChannelId, errors::AppError};

pub type HandlerResult = Result<Value, AppError>;

static MISSING_METHOD: HandlerDescriptor = HandlerDescriptor(Descriptor::Missing);

/// Wire-format method name, compared and hashed by exact byte content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodName(Box<[u8]>);

impl MethodName {
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for MethodName {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for MethodName {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for MethodName {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<&[u8]> for MethodName {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodName({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Per-call information handed to a handler alongside its params.
#[derive(Clone)]
pub struct RequestContext {
    pub method: MethodName,
    pub channel_id: ChannelId,
    pub registry: Arc<MethodRegistry>,
}

#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn call(&self, ctx: RequestContext, params: Value) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> RpcHandler for F
where
    F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext, params: Value) -> HandlerResult {
        self(ctx, params).await
    }
}

#[derive(Clone)]
enum Descriptor {
    Registered(Arc<dyn RpcHandler>),
    Missing,
}

/// Opaque reference to the handler of one method.
#[derive(Clone)]
pub struct HandlerDescriptor(Descriptor);

impl HandlerDescriptor {
    pub fn new(handler: impl RpcHandler + 'static) -> Self {
        Self(Descriptor::Registered(Arc::new(handler)))
    }

    /// The descriptor returned for names with no registered handler.
    pub fn missing() -> &'static Self {
        &MISSING_METHOD
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.0, Descriptor::Missing)
    }

    pub async fn invoke(&self, ctx: RequestContext, params: Value) -> HandlerResult {
        match &self.0 {
            Descriptor::Registered(handler) => handler.call(ctx, params).await,
            Descriptor::Missing => Err(AppError::unknown_method(ctx.method.to_string())),
        }
    }
}

impl PartialEq for HandlerDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Descriptor::Registered(left), Descriptor::Registered(right)) => {
                Arc::as_ptr(left).cast::<()>() == Arc::as_ptr(right).cast::<()>()
            }
            (Descriptor::Missing, Descriptor::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for HandlerDescriptor {}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Descriptor::Registered(handler) => f
                .debug_tuple("HandlerDescriptor::Registered")
                .field(&Arc::as_ptr(handler).cast::<()>())
                .finish(),
            Descriptor::Missing => f.write_str("HandlerDescriptor::Missing"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("method {method} is already registered")]
    Conflict { method: String },
}

/// Startup-only writer for the method table.
#[derive(Default)]
pub struct RegistryBuilder {
    methods: HashMap<MethodName, HandlerDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<MethodName>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_descriptor(name, HandlerDescriptor::new(handler))
    }

    pub fn register_descriptor(
        &mut self,
        name: impl Into<MethodName>,
        descriptor: HandlerDescriptor,
    ) -> Result<&mut Self, RegistrationError> {
        match self.methods.entry(name.into()) {
            Entry::Occupied(entry) => Err(RegistrationError::Conflict {
                method: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                debug!(method = %entry.key(), "rpc method registered");
                entry.insert(descriptor);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> MethodRegistry {
        info!(methods = self.methods.len(), "rpc method registry frozen");
        MethodRegistry {
            methods: self.methods,
        }
    }
}

/// Immutable method table shared by every request handler.
pub struct MethodRegistry {
    methods: HashMap<MethodName, HandlerDescriptor>,
}

impl MethodRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Resolves `name` by exact byte match, falling back to the missing-method descriptor.
    pub fn lookup(&self, name: &[u8]) -> &HandlerDescriptor {
        self.methods.get(name).unwrap_or(&MISSING_METHOD)
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().map(ToString::to_string).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::{
        HandlerDescriptor, HandlerResult, MethodRegistry, RegistrationError, RequestContext,
    };
    use crate::dispatch::tracker::ChannelId;

    fn constant(value: &'static str) -> HandlerDescriptor {
        HandlerDescriptor::new(move |_ctx: RequestContext, _params: Value| async move {
            HandlerResult::Ok(json!(value))
        })
    }

    fn scenario() -> (Arc<MethodRegistry>, HandlerDescriptor, HandlerDescriptor) {
        let h1 = constant("h1");
        let h2 = constant("h2");
        let mut builder = MethodRegistry::builder();
        builder
            .register_descriptor("buffer_get_lines", h1.clone())
            .expect("first registration")
            .register_descriptor("window_set_cursor", h2.clone())
            .expect("second registration");
        (Arc::new(builder.build()), h1, h2)
    }

    fn context(registry: &Arc<MethodRegistry>, method: &[u8]) -> RequestContext {
        RequestContext {
            method: method.into(),
            channel_id: ChannelId::new(3),
            registry: Arc::clone(registry),
        }
    }

    #[test]
    fn lookup_returns_registered_descriptor() {
        let (registry, h1, h2) = scenario();

        assert_eq!(registry.lookup(&b"buffer_get_lines"[..16]), &h1);
        assert_eq!(registry.lookup(&b"window_set_cursor"[..17]), &h2);
        assert_ne!(registry.lookup(b"buffer_get_lines"), &h2);
    }

    #[test]
    fn lookup_ignores_trailing_terminator_bytes() {
        let (registry, h1, _) = scenario();
        let terminated = b"buffer_get_lines\0garbage";

        assert_eq!(registry.lookup(&terminated[..16]), &h1);
        assert_eq!(
            registry.lookup(&terminated[..16]),
            registry.lookup("buffer_get_lines".to_string().as_bytes())
        );
        assert!(registry.lookup(&terminated[..17]).is_missing());
    }

    #[test]
    fn lookup_of_prefix_is_missing() {
        let (registry, _, _) = scenario();

        assert!(registry.lookup(&b"buffer_get_lines"[..15]).is_missing());
        assert!(registry.lookup(b"").is_missing());
    }

    #[tokio::test]
    async fn unknown_method_yields_structured_error() {
        let (registry, _, _) = scenario();
        let name = &b"nonexistent_method"[..18];

        let descriptor = registry.lookup(name);
        assert!(descriptor.is_missing());
        assert_eq!(descriptor, HandlerDescriptor::missing());

        let error = descriptor
            .invoke(context(&registry, name), Value::Array(vec![]))
            .await
            .expect_err("missing method must fail");
        assert_eq!(error.code(), "unknown_method");
        assert!(error.to_string().contains("nonexistent_method"));
    }

    #[tokio::test]
    async fn registered_descriptor_invokes_its_handler() {
        let (registry, _, _) = scenario();

        let result = registry
            .lookup(b"window_set_cursor")
            .invoke(context(&registry, b"window_set_cursor"), json!([]))
            .await
            .expect("registered handler");
        assert_eq!(result, json!("h2"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = MethodRegistry::builder();
        builder
            .register("input", |_ctx, _params| async { HandlerResult::Ok(Value::Null) })
            .expect("first registration");

        let error = builder
            .register("input", |_ctx, _params| async { HandlerResult::Ok(Value::Null) })
            .err()
            .expect("duplicate must fail");
        assert!(matches!(
            error,
            RegistrationError::Conflict { ref method } if method == "input"
        ));

        let registry = builder.build();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn independent_registries_do_not_share_entries() {
        let (first, _, _) = scenario();
        let second = MethodRegistry::builder().build();

        assert!(first.contains(b"buffer_get_lines"));
        assert!(!second.contains(b"buffer_get_lines"));
        assert!(second.is_empty());
    }

    #[test]
    fn method_names_are_sorted() {
        let (registry, _, _) = scenario();

        assert_eq!(
            registry.method_names(),
            vec!["buffer_get_lines".to_string(), "window_set_cursor".to_string()]
        );
    }
}
