//! API exposure modules
//!
//! Each exposure type consumes a `ServiceHost` and produces a Router.

pub mod rest;

pub use rest::RestExposure;
