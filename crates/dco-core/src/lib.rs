pub mod attestation;
pub mod backoff;
pub mod classify;
pub mod error;
pub mod locator;
pub mod model;
pub mod policy;

pub use attestation::*;
pub use backoff::*;
pub use classify::*;
pub use error::*;
pub use locator::*;
pub use model::*;
pub use policy::*;
