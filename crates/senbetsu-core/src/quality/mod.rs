pub mod taxonomy;

pub use taxonomy::{CategoryMatch, QualityCatalog, QualityItem, QualityItemConfig, QualityTaxonomy};
