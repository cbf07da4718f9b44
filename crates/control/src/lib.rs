pub mod delivery;
pub mod migrations;
pub mod store;

pub use delivery::*;
pub use migrations::*;
pub use store::*;
