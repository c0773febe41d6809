pub mod category;
pub mod release;

pub use category::{QualityCategory, QualitySet, QualitySlot};
pub use release::{MediaKind, ParsedRelease, ProbeInfo};
