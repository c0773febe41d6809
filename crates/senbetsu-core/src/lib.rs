//! # Senbetsu Core
//!
//! Release name parsing and quality priority engine. Provides the quality
//! taxonomy, the priority compiler and resolver, the release parser and the
//! configuration snapshot shared by concurrent searches.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use senbetsu_core::{MediaKind, QualityCategory, QualityTaxonomy, ReleaseParser};
//!
//! let taxonomy = Arc::new(QualityTaxonomy::builtin().unwrap());
//! let parser = ReleaseParser::new(taxonomy).unwrap();
//! let parsed = parser
//!     .parse("Movie.Name.2020.1080p.BluRay.x264-GROUP", MediaKind::Movie)
//!     .unwrap();
//!
//! assert_eq!(parsed.title, "Movie Name");
//! assert_eq!(parsed.year, Some(2020));
//! assert_eq!(parsed.quality_name(QualityCategory::Resolution), "1080p");
//! ```
pub mod config;
pub mod error;
pub mod parser;
pub mod quality;
pub mod scoring;
pub mod types;

// Re-export primary API
pub use config::{
    ConfigHandle, ConfigSnapshot, GeneralSettings, IndexerSettings, PathLimits, RegexTemplate,
    RegexTemplateConfig, Settings,
};
pub use error::{Result, SenbetsuError};
pub use parser::{CategoryFill, ReleaseParser};
pub use quality::{CategoryMatch, QualityCatalog, QualityItem, QualityItemConfig, QualityTaxonomy};
pub use scoring::{
    BonusMode, CategorySelection, Fallback, IndexerBinding, PriorityCategories, PriorityKey,
    PriorityMatch, PriorityResolver, PriorityTableEntry, PriorityTables, ProfileTable,
    QualityProfile, ReorderKind, ReorderRule, ResolveOptions,
};
pub use types::{MediaKind, ParsedRelease, ProbeInfo, QualityCategory, QualitySet, QualitySlot};
