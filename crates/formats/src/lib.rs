pub mod assets;
pub mod loader;
pub mod manifest;

pub use assets::*;
pub use loader::*;
pub use manifest::*;
