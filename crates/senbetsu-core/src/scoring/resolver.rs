//! # Priority Resolver
//!
//! Fills in missing category ids or names on a [`ParsedRelease`] and looks the
//! result up in the compiled [`PriorityTables`].

use serde::Serialize;
use tracing::{trace, warn};

use crate::quality::QualityTaxonomy;
use crate::types::{ParsedRelease, QualityCategory};

use super::context::ResolveOptions;
use super::profile::{BONUS_EXTENDED, BONUS_PROPER, BONUS_REPACK, QualityProfile};
use super::table::{PriorityKey, PriorityTables};

/// Outcome of one priority lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PriorityMatch {
    pub priority: i32,
    pub matched: bool,
}

impl PriorityMatch {
    const UNMATCHED: Self = Self {
        priority: 0,
        matched: false,
    };
}

/// Borrowing view over a taxonomy and the tables compiled from it.
#[derive(Debug, Clone, Copy)]
pub struct PriorityResolver<'a> {
    taxonomy: &'a QualityTaxonomy,
    tables: &'a PriorityTables,
}

impl<'a> PriorityResolver<'a> {
    #[must_use]
    pub fn new(taxonomy: &'a QualityTaxonomy, tables: &'a PriorityTables) -> Self {
        Self { taxonomy, tables }
    }

    /// Derives each missing id from its name and each missing name from its id.
    ///
    /// Names that are not in the catalog leave the id at the sentinel.
    pub fn fill_ids(&self, parsed: &mut ParsedRelease) {
        for category in QualityCategory::ALL {
            let slot = parsed.qualities.get_mut(category);
            if slot.id == 0 {
                if let Some(item) = slot
                    .name
                    .as_deref()
                    .and_then(|name| self.taxonomy.by_name(category, name))
                {
                    slot.id = item.id;
                    slot.name = Some(item.name.clone());
                }
            } else if slot.name.as_deref().is_none_or(str::is_empty) {
                match self.taxonomy.by_id(category, slot.id) {
                    Some(item) => slot.name = Some(item.name.clone()),
                    None => slot.id = 0,
                }
            }
        }
    }

    /// Looks up a key without any bonus.
    ///
    /// A combination whose priority is 0 carries no information and is
    /// reported as unmatched.
    #[must_use]
    pub fn lookup(
        &self,
        ids: [u32; 4],
        profile: &QualityProfile,
        options: ResolveOptions,
    ) -> PriorityMatch {
        let Some(table) = self.tables.profile(&profile.name) else {
            warn!(profile = %profile.name, "no compiled priority table for profile");
            return PriorityMatch::UNMATCHED;
        };

        let mut masked = [0u32; 4];
        for category in QualityCategory::ALL {
            if options.uses(profile, category) {
                masked[category.index()] = ids[category.index()];
            }
        }
        let key = PriorityKey::from_ids(masked);

        let found = table.wanted(key).or_else(|| {
            if options.allows_fallback() {
                table.all(key)
            } else {
                None
            }
        });

        match found {
            Some(priority) if priority != 0 => PriorityMatch {
                priority,
                matched: true,
            },
            _ => PriorityMatch::UNMATCHED,
        }
    }

    /// Fills the ids of `parsed`, resolves its priority under `profile` and
    /// stores it in `parsed.priority`.
    pub fn resolve(
        &self,
        parsed: &mut ParsedRelease,
        profile: &QualityProfile,
        options: ResolveOptions,
    ) -> PriorityMatch {
        self.fill_ids(parsed);

        let mut result = self.lookup(parsed.qualities.ids(), profile, options);
        if result.matched && options.bonus_enabled(profile) {
            result.priority = result.priority.saturating_add(other_bonus(parsed));
        }

        trace!(
            release = %parsed.raw,
            profile = %profile.name,
            priority = result.priority,
            matched = result.matched,
            "resolved priority"
        );
        parsed.priority = result.priority;
        result
    }
}

fn other_bonus(parsed: &ParsedRelease) -> i32 {
    let mut bonus = 0;
    if parsed.proper {
        bonus += BONUS_PROPER;
    }
    if parsed.extended {
        bonus += BONUS_EXTENDED;
    }
    if parsed.repack {
        bonus += BONUS_REPACK;
    }
    bonus
}
