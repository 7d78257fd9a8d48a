//! Endpoint listing for service introspection.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use crate::routing::{Interface, ResourceDescriptor, Router, Verb};

/// Serves `GET /` with every registered path per verb.
///
/// The listing is refreshed whenever a router built from this interface
/// finishes initialization; the latest router wins.
#[derive(Debug, Default)]
pub struct DiscoveryInterface {
    endpoints: Arc<RwLock<Option<Value>>>,
}

impl DiscoveryInterface {
    pub fn new() -> Self {
        Self::default()
    }
}

fn endpoints_to_json(endpoints: BTreeMap<String, Vec<String>>) -> Value {
    let map: Map<String, Value> = endpoints
        .into_iter()
        .map(|(verb, paths)| (verb, Value::Array(paths.into_iter().map(Value::String).collect())))
        .collect();
    Value::Object(map)
}

impl Interface for DiscoveryInterface {
    fn name(&self) -> &str {
        "discovery"
    }

    fn resources(&self) -> Vec<ResourceDescriptor> {
        let endpoints = Arc::clone(&self.endpoints);
        vec![ResourceDescriptor::new("list_endpoints", move |_kwargs| {
            let listing = endpoints.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            Ok(listing.clone().unwrap_or(Value::Null))
        })
        .route(Verb::Get, "/")]
    }

    fn initialized(&self, router: &Router) {
        let listing = endpoints_to_json(router.endpoints());
        let mut current = self.endpoints.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.replace(listing).is_some() {
            tracing::debug!("Endpoint listing replaced by a newer router");
        }
    }
}
