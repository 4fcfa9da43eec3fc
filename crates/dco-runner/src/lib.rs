pub mod config;
pub mod scanner;
pub mod scratch;

pub use config::*;
pub use scanner::*;
pub use scratch::*;
