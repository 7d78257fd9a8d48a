//! Resource descriptors and the interfaces that expose them.
//!
//! Interfaces declare their resources explicitly; nothing is discovered by
//! inspecting objects at runtime.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{WireError, WireResult};
use crate::package::Kwargs;
use crate::routing::router::Router;

/// HTTP verbs a resource can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WireError::ResourceTypeNotFound(s.to_string()))
    }
}

/// Unique registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub verb: Verb,
    pub path: String,
}

/// Callable behind a resource.
pub type Handler = Arc<dyn Fn(Kwargs) -> WireResult<Value> + Send + Sync>;

/// A dispatchable resource.
#[derive(Clone)]
pub struct Resource {
    name: String,
    handler: Handler,
}

impl Resource {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Kwargs) -> WireResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, kwargs: Kwargs) -> WireResult<Value> {
        (self.handler)(kwargs)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource").field("name", &self.name).finish()
    }
}

/// Whether a descriptor takes part in registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Registered unless the name starts with `_`.
    #[default]
    Default,
    /// Always registered, even with a leading underscore.
    Public,
    /// Never registered.
    Private,
}

/// Routing metadata for one handler of an interface.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub resource: Resource,
    /// Verb; `GET` when unset.
    pub verb: Option<Verb>,
    /// Path; `/<name>` when unset.
    pub path: Option<String>,
    pub visibility: Visibility,
    /// Also callable as a host command under its own name.
    pub expose_as_command: bool,
}

impl ResourceDescriptor {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Kwargs) -> WireResult<Value> + Send + Sync + 'static,
    {
        Self {
            resource: Resource::new(name, handler),
            verb: None,
            path: None,
            visibility: Visibility::Default,
            expose_as_command: false,
        }
    }

    /// Register under `verb` at `path`.
    pub fn route(mut self, verb: Verb, path: impl Into<String>) -> Self {
        self.verb = Some(verb);
        self.path = Some(path.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub fn expose_as_command(mut self) -> Self {
        self.expose_as_command = true;
        self
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }

    pub fn is_registrable(&self) -> bool {
        match self.visibility {
            Visibility::Private => false,
            Visibility::Public => true,
            Visibility::Default => !self.name().starts_with('_'),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            verb: self.verb.unwrap_or(Verb::Get),
            path: self
                .path
                .clone()
                .unwrap_or_else(|| format!("/{}", self.name())),
        }
    }
}

/// A group of resources registered with the router.
pub trait Interface: Send + Sync {
    fn name(&self) -> &str;

    /// Resources this interface offers, computed once at registration.
    fn resources(&self) -> Vec<ResourceDescriptor>;

    /// Called once the router is complete and frozen.
    fn initialized(&self, _router: &Router) {}
}
