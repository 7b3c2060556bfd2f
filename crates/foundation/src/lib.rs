pub mod handles;
pub mod math;

// Typed handles and the f64 math the scene is built on.
pub use handles::*;
