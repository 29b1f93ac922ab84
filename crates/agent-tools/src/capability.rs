//! Capability trait definition

use crate::{CapabilityError, ParameterSchema};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Name, description and argument contract of a capability
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySpec {
    name: String,
    description: String,
    parameters: ParameterSchema,
    timeout: Option<Duration>,
}

impl CapabilitySpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParameterSchema::new(),
            timeout: None,
        }
    }

    pub fn parameters(mut self, parameters: ParameterSchema) -> Self {
        self.parameters = parameters;
        self
    }

    /// Per-capability deadline; overrides the registry default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.parameters
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }

    /// JSON Schema of the arguments, as sent to the model
    pub fn input_schema(&self) -> Value {
        self.parameters.to_json_schema()
    }
}

/// Trait for capabilities that agents can call
///
/// Capabilities are functions that LLM agents call to reach the outside world.
/// They have no access to the pipeline's state store. `execute` receives
/// arguments that have already been validated and default-filled against
/// [`CapabilitySpec::schema`].
#[async_trait]
pub trait Capability: Send + Sync {
    /// Name, description and parameter schema
    fn spec(&self) -> &CapabilitySpec;

    /// Get the capability's name
    ///
    /// Must be unique within a registry and match the name the model calls
    fn name(&self) -> &str {
        self.spec().name()
    }

    /// Execute with validated arguments
    async fn execute(&self, args: Value) -> Result<Value, CapabilityError>;
}

type Handler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, CapabilityError>> + Send + Sync>;

/// Capability backed by a closure
///
/// Used for deterministic stubs and for small capabilities that do not need
/// their own type.
///
/// # Example
///
/// ```
/// use agent_tools::{CapabilitySpec, FnCapability, ParamSpec, ParameterSchema};
/// use serde_json::json;
///
/// let quote = FnCapability::new(
///     CapabilitySpec::new("get_stock_quote", "Real-time quote")
///         .parameters(ParameterSchema::new().param(ParamSpec::string("symbol").required())),
///     |args| async move { Ok(json!({ "symbol": args["symbol"], "current_price": 150.0 })) },
/// );
/// ```
pub struct FnCapability {
    spec: CapabilitySpec,
    handler: Handler,
}

impl FnCapability {
    pub fn new<F, Fut>(spec: CapabilitySpec, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
    {
        Self {
            spec,
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Capability that always returns `value`
    pub fn constant(spec: CapabilitySpec, value: Value) -> Self {
        Self::new(spec, move |_| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }
}

impl std::fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCapability")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        (self.handler)(args).await
    }
}
