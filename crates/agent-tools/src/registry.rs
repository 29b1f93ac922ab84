//! Capability registry and dispatch

use crate::{Capability, CapabilityError};
use agent_core::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default deadline for a single capability call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one dispatched call
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Result document, or an error document when `is_error`
    pub result: Value,
    pub is_error: bool,
    pub duration: Duration,
}

/// Registry for managing capabilities
///
/// Registration happens while the pipeline is being built; afterwards the
/// registry is shared read-only.
#[derive(Clone)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
    order: Vec<String>,
    unavailable: BTreeMap<String, String>,
    default_timeout: Duration,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self {
            capabilities: HashMap::new(),
            order: Vec::new(),
            unavailable: BTreeMap::new(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.order)
            .field("unavailable", &self.unavailable)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl CapabilityRegistry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline for capabilities that do not declare their own
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a capability; names must be unique
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(Error::Configuration(format!(
                "capability '{name}' registered twice"
            )));
        }
        debug!(capability = %name, "Registered capability");
        self.order.push(name.clone());
        self.capabilities.insert(name, capability);
        Ok(())
    }

    /// Record a known capability that cannot be offered in this environment
    ///
    /// Agents that declare it are built without it instead of failing.
    pub fn declare_unavailable(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        let name = name.into();
        let reason = reason.into();
        debug!(capability = %name, reason = %reason, "Capability unavailable");
        self.unavailable.insert(name, reason);
    }

    /// Why a capability is unavailable, if it was declared so
    pub fn unavailable_reason(&self, name: &str) -> Option<&str> {
        self.unavailable.get(name).map(String::as_str)
    }

    /// Unavailable capabilities and their reasons
    pub fn unavailable(&self) -> &BTreeMap<String, String> {
        &self.unavailable
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, capability: Arc<dyn Capability>) -> Result<Self> {
        self.register(capability)?;
        Ok(self)
    }

    /// Get a capability by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// All registered capabilities, in registration order
    pub fn list(&self) -> Vec<Arc<dyn Capability>> {
        self.order
            .iter()
            .filter_map(|name| self.capabilities.get(name).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Registry holding only `names`, in the order given
    ///
    /// Names declared unavailable are skipped with a warning; any other
    /// unknown name is a configuration error.
    pub fn subset(&self, names: &[String]) -> Result<Self> {
        let mut subset = Self::new().with_default_timeout(self.default_timeout);
        for name in names {
            if let Some(capability) = self.get(name) {
                subset.register(capability)?;
            } else if let Some(reason) = self.unavailable_reason(name) {
                warn!(capability = %name, reason = %reason, "Skipping unavailable capability");
                subset.declare_unavailable(name.clone(), reason);
            } else {
                return Err(Error::Configuration(format!("unknown capability '{name}'")));
            }
        }
        Ok(subset)
    }

    /// Look up, validate, execute with a deadline, and normalise the result
    ///
    /// Never fails: every problem comes back as an error document with
    /// `is_error` set.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Dispatched {
        let started = Instant::now();
        let outcome = self.try_dispatch(name, args).await;
        let duration = started.elapsed();

        match outcome {
            Ok(result) => {
                info!(
                    capability = %name,
                    duration_ms = duration.as_millis() as u64,
                    "Capability call succeeded"
                );
                Dispatched {
                    result,
                    is_error: false,
                    duration,
                }
            }
            Err(e) => {
                warn!(
                    capability = %name,
                    error_kind = e.kind(),
                    error = %e,
                    duration_ms = duration.as_millis() as u64,
                    "Capability call failed"
                );
                Dispatched {
                    result: e.to_document(),
                    is_error: true,
                    duration,
                }
            }
        }
    }

    async fn try_dispatch(&self, name: &str, args: &Value) -> std::result::Result<Value, CapabilityError> {
        let capability = self
            .get(name)
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))?;

        let validated = capability
            .spec()
            .schema()
            .validate(args)
            .map_err(CapabilityError::Validation)?;

        let deadline = capability.spec().deadline().unwrap_or(self.default_timeout);
        debug!(capability = %name, args = %validated, "Dispatching capability");

        tokio::time::timeout(deadline, capability.execute(validated))
            .await
            .map_err(|_| CapabilityError::Timeout(deadline))?
    }
}
