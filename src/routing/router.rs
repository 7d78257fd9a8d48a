//! Resource registry and dispatch.
//!
//! # Responsibilities
//! - Collect resources from every registered interface
//! - Look up `(verb, path)` and invoke the matching resource
//! - Report the registered endpoints for service introspection
//!
//! # Design Decisions
//! - Built once, immutable afterwards (shared via Arc without locks)
//! - Last registration wins on a `(verb, path)` collision
//! - An unknown verb and an unknown path are distinct failures
//! - An empty registry after initialization is a configuration error

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{WireError, WireResult};
use crate::package::{Kwargs, ReturnCode};
use crate::routing::resource::{Interface, Resource, Verb};

/// Kwarg carrying the request's header data into verb handlers.
pub const HEADER_DATA_KWARG: &str = "_header_data";

/// Verb → path → resource.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    resources: HashMap<Verb, BTreeMap<String, Resource>>,
}

impl ResourceRegistry {
    /// Insert a resource, returning the one it replaced.
    pub fn insert(&mut self, verb: Verb, path: String, resource: Resource) -> Option<Resource> {
        self.resources.entry(verb).or_default().insert(path, resource)
    }

    pub fn paths(&self, verb: Verb) -> Option<&BTreeMap<String, Resource>> {
        self.resources.get(&verb)
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps `(verb, path)` pairs to resources.
#[derive(Debug, Default)]
pub struct Router {
    registry: ResourceRegistry,
    /// Resources also callable directly by name.
    commands: BTreeMap<String, Resource>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a router from every interface's resources.
    pub fn from_interfaces(interfaces: &[Arc<dyn Interface>]) -> WireResult<Self> {
        let mut router = Router::new();
        for interface in interfaces {
            router.add_interface(interface.as_ref());
        }

        if router.registry.is_empty() {
            let msg = "No resources registered - please register at least one resource";
            tracing::error!("{}", msg);
            return Err(WireError::Configuration(msg.into()));
        }

        for interface in interfaces {
            interface.initialized(&router);
        }

        tracing::info!(
            interfaces = interfaces.len(),
            resources = router.registry.len(),
            "Router initialized"
        );
        Ok(router)
    }

    /// Register every eligible resource of `interface`.
    pub fn add_interface(&mut self, interface: &dyn Interface) {
        for descriptor in interface.resources() {
            if !descriptor.is_registrable() {
                tracing::trace!(
                    interface = interface.name(),
                    resource = descriptor.name(),
                    "Skipping private resource"
                );
                continue;
            }

            let key = descriptor.key();
            if descriptor.expose_as_command {
                self.commands
                    .insert(descriptor.name().to_string(), descriptor.resource.clone());
            }
            self.register_resource(key.verb, key.path, descriptor.resource);
        }
    }

    /// Register a resource; an existing one at the same key is replaced.
    pub fn register_resource(&mut self, verb: Verb, path: impl Into<String>, resource: Resource) {
        let path = path.into();
        tracing::debug!(
            resource = resource.name(),
            verb = %verb,
            path = %path,
            "Registering resource"
        );
        if let Some(previous) = self.registry.insert(verb, path.clone(), resource) {
            tracing::debug!(
                replaced = previous.name(),
                verb = %verb,
                path = %path,
                "Resource overwritten"
            );
        }
    }

    /// Start a route: `router.on(Verb::Get, "/items").handle(|kwargs| ...)`.
    pub fn on(&mut self, verb: Verb, path: impl Into<String>) -> RouteBuilder<'_> {
        RouteBuilder {
            router: self,
            verb,
            path: path.into(),
        }
    }

    pub fn get_resource(&self, verb: Verb, path: &str) -> WireResult<&Resource> {
        let Some(paths) = self.registry.paths(verb) else {
            let err = WireError::ResourceTypeNotFound(verb.to_string());
            tracing::error!(verb = %verb, "{}", err);
            return Err(err);
        };

        paths.get(path).ok_or_else(|| {
            let err = WireError::ResourceNotFound {
                verb: verb.to_string(),
                path: path.to_string(),
            };
            tracing::error!(verb = %verb, path, "{}", err);
            err
        })
    }

    /// A resource exposed as a host command.
    pub fn command(&self, name: &str) -> Option<&Resource> {
        self.commands.get(name)
    }

    /// Look up the resource for `verb` and the requested path, then call it.
    ///
    /// The path comes from the `_header_data` kwarg when present (which is
    /// removed before the call), otherwise from the `path` kwarg.
    pub fn dispatch(&self, verb: Verb, mut kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        let header_path = kwargs
            .remove(HEADER_DATA_KWARG)
            .and_then(|header| header.get("path").and_then(Value::as_str).map(str::to_string));
        let path = header_path
            .or_else(|| kwargs.get("path").and_then(Value::as_str).map(str::to_string))
            .filter(|path| !path.is_empty());

        let Some(path) = path else {
            tracing::error!(verb = %verb, "Dispatch without a path argument");
            return Err(WireError::MissingPath);
        };

        let resource = self.get_resource(verb, &path)?;
        tracing::debug!(verb = %verb, path = %path, resource = resource.name(), "Dispatching");
        Ok((resource.call(kwargs)?, ReturnCode::Ok))
    }

    pub fn get(&self, kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        self.dispatch(Verb::Get, kwargs)
    }

    pub fn post(&self, kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        self.dispatch(Verb::Post, kwargs)
    }

    pub fn put(&self, kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        self.dispatch(Verb::Put, kwargs)
    }

    pub fn patch(&self, kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        self.dispatch(Verb::Patch, kwargs)
    }

    pub fn delete(&self, kwargs: Kwargs) -> WireResult<(Value, ReturnCode)> {
        self.dispatch(Verb::Delete, kwargs)
    }

    /// Sorted unique paths per verb.
    pub fn endpoints(&self) -> BTreeMap<String, Vec<String>> {
        Verb::ALL
            .into_iter()
            .filter_map(|verb| {
                let paths = self.registry.paths(verb)?;
                Some((verb.to_string(), paths.keys().cloned().collect()))
            })
            .collect()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}

/// Pending route created by [`Router::on`].
pub struct RouteBuilder<'a> {
    router: &'a mut Router,
    verb: Verb,
    path: String,
}

impl RouteBuilder<'_> {
    pub fn handle<F>(self, handler: F)
    where
        F: Fn(Kwargs) -> WireResult<Value> + Send + Sync + 'static,
    {
        let name = format!("{} {}", self.verb, self.path);
        self.router
            .register_resource(self.verb, self.path, Resource::new(name, handler));
    }
}
