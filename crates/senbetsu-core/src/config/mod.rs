pub mod settings;
pub mod snapshot;

pub use settings::{GeneralSettings, IndexerSettings, PathLimits, RegexTemplateConfig, Settings};
pub use snapshot::{ConfigHandle, ConfigSnapshot, RegexTemplate};
