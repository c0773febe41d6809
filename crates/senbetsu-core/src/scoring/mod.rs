pub mod context;
pub mod profile;
pub mod resolver;
pub mod table;

pub use context::{BonusMode, CategorySelection, Fallback, ResolveOptions};
pub use profile::{
    BONUS_EXTENDED, BONUS_PROPER, BONUS_REPACK, IndexerBinding, PriorityCategories,
    QualityProfile, ReorderKind, ReorderRule,
};
pub use resolver::{PriorityMatch, PriorityResolver};
pub use table::{PriorityKey, PriorityTableEntry, PriorityTables, ProfileTable};
