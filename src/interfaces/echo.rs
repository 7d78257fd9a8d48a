//! Demo resources served by the binary.

use serde_json::{json, Value};

use crate::routing::{Interface, ResourceDescriptor, Verb};

/// Echoes keyword arguments back; `ping` is also a plain command.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoInterface;

impl Interface for EchoInterface {
    fn name(&self) -> &str {
        "echo"
    }

    fn resources(&self) -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor::new("echo", |kwargs| Ok(Value::Object(kwargs))),
            ResourceDescriptor::new("echo_post", |kwargs| Ok(Value::Object(kwargs))).route(Verb::Post, "/echo"),
            ResourceDescriptor::new("ping", |_| Ok(json!("pong"))).expose_as_command(),
        ]
    }
}
