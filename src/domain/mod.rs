pub mod forecast;
pub mod timestamp;
pub mod types;

pub use forecast::*;
pub use types::*;
