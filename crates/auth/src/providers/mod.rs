//! CAS client implementations.
//!
//! - `CasServer` validates tickets against a real CAS server over HTTP.
//! - `MockCas` (with `mock` feature) accepts tickets minted by the local mock login page.

mod cas;
#[cfg(feature = "mock")]
pub(crate) mod mock;

pub use cas::CasServer;
#[cfg(feature = "mock")]
pub use mock::MockCas;
