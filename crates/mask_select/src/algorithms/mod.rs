pub mod perimeter;
pub mod metrics;
pub mod scoring;
pub mod selection;

pub use perimeter::*;
pub use metrics::*;
pub use scoring::*;
pub use selection::*;
