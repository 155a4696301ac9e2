// Source analysis: classification, parsing and reference extraction
pub mod classifier;
pub mod reference_extractor;
pub mod style_processor;
pub mod transformer;

pub use reference_extractor::{extract_entry_references, extract_references};
pub use transformer::*;
