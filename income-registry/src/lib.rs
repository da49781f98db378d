//! income-registry: client for the income registry service.
//!
//! The `IncomeRegistry` trait is the seam the enricher depends on; `HttpIncomeRegistry`
//! is the reqwest implementation used in production.

pub mod error;
pub mod http;
pub mod registry;

pub use error::RegistryError;
pub use http::HttpIncomeRegistry;
pub use registry::{ContextRequest, IncomeRegistry};
