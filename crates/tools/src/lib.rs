pub mod inspect;
pub mod simulate;

pub use inspect::*;
pub use simulate::*;
