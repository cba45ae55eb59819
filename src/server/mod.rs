//! Server module for building the invoice HTTP server
//!
//! `ServerBuilder` collects the backend ports, `ServiceHost` wires them into
//! the services, and `RestExposure` turns the host into an Axum router.

pub mod builder;
pub mod exposure;
pub mod extract;
pub mod handlers;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use extract::JsonBody;
pub use host::{HostComponents, ServiceHost};
