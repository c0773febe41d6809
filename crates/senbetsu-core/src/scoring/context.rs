use serde::{Deserialize, Serialize};

use crate::types::QualityCategory;

use super::profile::QualityProfile;

/// Which categories contribute to the lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    /// Only the categories the profile marks as priority-relevant.
    #[default]
    ProfileFlags,
    /// Every category, regardless of the profile flags.
    All,
}

/// Whether the proper/extended/repack bonus is added to a matched priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMode {
    /// Follow the profile's `use_other_bonus` flag.
    #[default]
    Profile,
    Always,
    Never,
}

/// Which tables the resolver may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Only combinations on the profile's wanted lists.
    WantedOnly,
    /// Wanted combinations first, then the complete cross-product.
    #[default]
    AllCombinations,
}

/// How one priority lookup is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub categories: CategorySelection,
    pub other_bonus: BonusMode,
    pub fallback: Fallback,
}

impl ResolveOptions {
    /// Mode used when scoring search candidates and held files: profile
    /// flags, profile bonus, fallback to all combinations.
    #[must_use]
    pub const fn search() -> Self {
        Self {
            categories: CategorySelection::ProfileFlags,
            other_bonus: BonusMode::Profile,
            fallback: Fallback::AllCombinations,
        }
    }

    /// Only wanted combinations count as matched.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            categories: CategorySelection::ProfileFlags,
            other_bonus: BonusMode::Profile,
            fallback: Fallback::WantedOnly,
        }
    }

    #[must_use]
    pub const fn with_categories(mut self, categories: CategorySelection) -> Self {
        self.categories = categories;
        self
    }

    #[must_use]
    pub const fn with_bonus(mut self, other_bonus: BonusMode) -> Self {
        self.other_bonus = other_bonus;
        self
    }

    /// Returns `true` if `category` is part of the lookup key under `profile`.
    #[must_use]
    pub fn uses(&self, profile: &QualityProfile, category: QualityCategory) -> bool {
        match self.categories {
            CategorySelection::All => true,
            CategorySelection::ProfileFlags => profile.priority_categories.uses(category),
        }
    }

    /// Returns `true` if the bonus applies under `profile`.
    #[must_use]
    pub fn bonus_enabled(&self, profile: &QualityProfile) -> bool {
        match self.other_bonus {
            BonusMode::Profile => profile.use_other_bonus,
            BonusMode::Always => true,
            BonusMode::Never => false,
        }
    }

    #[must_use]
    pub fn allows_fallback(&self) -> bool {
        matches!(self.fallback, Fallback::AllCombinations)
    }
}
