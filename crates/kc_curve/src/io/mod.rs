pub mod observations;
pub mod export;

pub use observations::*;
pub use export::*;
