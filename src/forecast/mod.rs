pub mod features;
pub mod metrics;

pub use features::*;
pub use metrics::*;
