pub mod patterns;
pub mod release;

pub use patterns::MetadataPatterns;
pub use release::{CategoryFill, ReleaseParser};
