pub mod mailerlite;

pub use mailerlite::*;
