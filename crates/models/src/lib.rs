pub mod config;
pub mod email;
pub mod error;

pub use config::*;
pub use email::*;
pub use error::*;
