pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::*;
pub use error::*;
pub use retry::*;
pub use types::*;
