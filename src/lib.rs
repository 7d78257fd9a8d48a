//! HTTP wire adapter and resource router for command-style services.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod interfaces;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod package;
pub mod routing;
pub mod server;

pub use config::schema::BridgeConfig;
pub use error::{WireError, WireResult};
pub use lifecycle::Shutdown;
pub use package::{Kwargs, Package, ReturnCode};
pub use routing::{Interface, ResourceDescriptor, Router, Verb};
pub use server::{Pipeline, Server};
