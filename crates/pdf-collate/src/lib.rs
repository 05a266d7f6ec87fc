pub mod compose;
mod registry;
mod sequence;
mod types;

pub use compose::{FitTransform, SIZE_TOLERANCE_PT, export, fit_transform};
pub use registry::{SourceRegistry, probe_page_count};
pub use sequence::*;
pub use types::*;
