pub mod filter;
pub mod window;
pub mod drops;
pub mod smoothing;
pub mod interpolation;
pub mod breakpoints;
pub mod kc;

mod linalg;

pub use filter::*;
pub use window::*;
pub use drops::*;
pub use smoothing::*;
pub use interpolation::*;
pub use breakpoints::*;
pub use kc::*;
