//! Built-in interfaces.

pub mod discovery;
pub mod echo;

pub use discovery::DiscoveryInterface;
pub use echo::EchoInterface;
