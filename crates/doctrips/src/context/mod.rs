//! Request-scoped context module.
//!
//! Provides the `RequestContext` extractor that bundles the signed-in user
//! and a request id alongside the application-scoped `AppState`.

mod extractor;
mod types;

pub use types::{RequestContext, RequestId};
