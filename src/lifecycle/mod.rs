//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (binary):
//!     Load config → Validate → Build router → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C or trigger() → Stop accepting → In-flight transactions finish → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
