//! # Priority Compiler
//!
//! Expands the quality taxonomy against every quality profile into a dense
//! lookup table: one slot per `(resolution, quality, codec, audio)` id
//! combination, sentinels included. Tables are built once per configuration
//! load and never modified afterwards.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::quality::{QualityItem, QualityTaxonomy};
use crate::types::QualityCategory;

use super::profile::{QualityProfile, ReorderKind};

/// Lookup key: one item id per category, 0 meaning unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PriorityKey {
    pub resolution: u32,
    pub quality: u32,
    pub codec: u32,
    pub audio: u32,
}

impl PriorityKey {
    /// Builds a key from ids in category table order.
    #[must_use]
    pub fn from_ids(ids: [u32; 4]) -> Self {
        Self {
            resolution: ids[0],
            quality: ids[1],
            codec: ids[2],
            audio: ids[3],
        }
    }

    /// Ids in category table order.
    #[must_use]
    pub fn ids(self) -> [u32; 4] {
        [self.resolution, self.quality, self.codec, self.audio]
    }

    /// Returns the id stored for `category`.
    #[must_use]
    pub fn get(self, category: QualityCategory) -> u32 {
        self.ids()[category.index()]
    }
}

/// One row of a compiled table, as exposed for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityTableEntry {
    pub profile: String,
    pub resolution_id: u32,
    pub quality_id: u32,
    pub codec_id: u32,
    pub audio_id: u32,
    pub priority: i32,
}

/// Compiled combinations of a single profile.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    name: String,
    dims: [usize; 4],
    priorities: Vec<i32>,
    wanted: Vec<bool>,
    cutoff: Option<i32>,
}

impl ProfileTable {
    fn slot(&self, key: PriorityKey) -> Option<usize> {
        let ids = key.ids();
        let mut index = 0usize;
        for (id, dim) in ids.iter().zip(self.dims) {
            let id = *id as usize;
            if id >= dim {
                return None;
            }
            index = index * dim + id;
        }
        Some(index)
    }

    fn key_at(&self, mut index: usize) -> PriorityKey {
        let mut ids = [0u32; 4];
        for pos in (0..4).rev() {
            ids[pos] = (index % self.dims[pos]) as u32;
            index /= self.dims[pos];
        }
        PriorityKey::from_ids(ids)
    }

    /// Profile name as configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Priority of `key` in the complete cross-product.
    #[must_use]
    pub fn all(&self, key: PriorityKey) -> Option<i32> {
        self.slot(key).map(|i| self.priorities[i])
    }

    /// Priority of `key` if every category value is on the profile's wanted lists.
    #[must_use]
    pub fn wanted(&self, key: PriorityKey) -> Option<i32> {
        self.slot(key)
            .filter(|&i| self.wanted[i])
            .map(|i| self.priorities[i])
    }

    /// Priority at which held media is no longer upgraded.
    #[must_use]
    pub fn cutoff(&self) -> Option<i32> {
        self.cutoff
    }

    /// Number of entries in the complete cross-product.
    #[must_use]
    pub fn len_all(&self) -> usize {
        self.priorities.len()
    }

    /// Number of wanted entries.
    #[must_use]
    pub fn len_wanted(&self) -> usize {
        self.wanted.iter().filter(|w| **w).count()
    }

    fn entry(&self, index: usize) -> PriorityTableEntry {
        let key = self.key_at(index);
        PriorityTableEntry {
            profile: self.name.clone(),
            resolution_id: key.resolution,
            quality_id: key.quality,
            codec_id: key.codec,
            audio_id: key.audio,
            priority: self.priorities[index],
        }
    }

    /// Every entry of the complete cross-product.
    pub fn all_entries(&self) -> impl Iterator<Item = PriorityTableEntry> + '_ {
        (0..self.priorities.len()).map(|i| self.entry(i))
    }

    /// Every wanted entry.
    pub fn wanted_entries(&self) -> impl Iterator<Item = PriorityTableEntry> + '_ {
        (0..self.priorities.len())
            .filter(|&i| self.wanted[i])
            .map(|i| self.entry(i))
    }
}

/// `AllCombinations` and `WantedCombinations` for every configured profile.
#[derive(Debug, Clone, Default)]
pub struct PriorityTables {
    profiles: HashMap<String, ProfileTable>,
}

impl PriorityTables {
    /// Compiles the tables of every profile against `taxonomy`.
    #[must_use]
    pub fn compile(taxonomy: &QualityTaxonomy, profiles: &[QualityProfile]) -> Self {
        let mut tables = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            let table = compile_profile(taxonomy, profile);
            debug!(
                profile = %profile.name,
                all = table.len_all(),
                wanted = table.len_wanted(),
                "compiled priority table"
            );
            tables.insert(profile.name.to_lowercase(), table);
        }
        Self { profiles: tables }
    }

    /// Table of the profile called `name`, ignoring case.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ProfileTable> {
        self.profiles.get(&name.to_lowercase())
    }

    /// Number of compiled profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` when no profile is compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Iterates over all compiled profile tables.
    pub fn iter(&self) -> impl Iterator<Item = &ProfileTable> {
        self.profiles.values()
    }
}

fn compile_profile(taxonomy: &QualityTaxonomy, profile: &QualityProfile) -> ProfileTable {
    let resolutions = taxonomy.items(QualityCategory::Resolution);
    let qualities = taxonomy.items(QualityCategory::Quality);
    let codecs = taxonomy.items(QualityCategory::Codec);
    let audios = taxonomy.items(QualityCategory::Audio);

    let dims = [resolutions.len(), qualities.len(), codecs.len(), audios.len()];
    let size = dims.iter().product();
    let mut priorities = Vec::with_capacity(size);
    let mut wanted = Vec::with_capacity(size);

    // Index order must match ProfileTable::slot: resolution is the outermost loop.
    for res in resolutions {
        for qual in qualities {
            for codec in codecs {
                for audio in audios {
                    let items = [res, qual, codec, audio];
                    priorities.push(combination_priority(profile, items));
                    wanted.push(is_wanted(profile, items));
                }
            }
        }
    }

    let mut table = ProfileTable {
        name: profile.name.clone(),
        dims,
        priorities,
        wanted,
        cutoff: None,
    };
    table.cutoff = cutoff_priority(taxonomy, profile, &table);
    table
}

fn combination_priority(profile: &QualityProfile, items: [&QualityItem; 4]) -> i32 {
    let [res, qual, codec, audio] = items;
    let mut weights = [res.weight, qual.weight, codec.weight, audio.weight];
    let mut combined = None;

    for rule in &profile.reorder {
        let name = rule.name.trim();
        if name.is_empty() {
            continue;
        }
        match rule.kind {
            ReorderKind::Resolution if res.name.eq_ignore_ascii_case(name) => {
                weights[0] = rule.new_priority;
            }
            ReorderKind::Quality if qual.name.eq_ignore_ascii_case(name) => {
                weights[1] = rule.new_priority;
            }
            ReorderKind::Codec if codec.name.eq_ignore_ascii_case(name) => {
                weights[2] = rule.new_priority;
            }
            ReorderKind::Audio if audio.name.eq_ignore_ascii_case(name) => {
                weights[3] = rule.new_priority;
            }
            ReorderKind::Position if res.name.eq_ignore_ascii_case(name) => {
                weights[0] = weights[0].saturating_mul(rule.new_priority);
            }
            ReorderKind::Combined => {
                if let Some((r, q)) = rule.combined_parts() {
                    if res.name.eq_ignore_ascii_case(r) && qual.name.eq_ignore_ascii_case(q) {
                        combined = Some(rule.new_priority);
                    }
                }
            }
            _ => {}
        }
    }

    // A matching resolution+quality pair overrides both of their weights.
    if let Some(new_priority) = combined {
        weights[0] = new_priority;
        weights[1] = 0;
    }

    weights.iter().fold(0i32, |acc, w| acc.saturating_add(*w))
}

fn is_wanted(profile: &QualityProfile, items: [&QualityItem; 4]) -> bool {
    items.iter().all(|item| {
        let list = profile.wanted(item.category);
        list.is_empty() || list.iter().any(|w| w.eq_ignore_ascii_case(&item.name))
    })
}

fn cutoff_priority(
    taxonomy: &QualityTaxonomy,
    profile: &QualityProfile,
    table: &ProfileTable,
) -> Option<i32> {
    if profile.cutoff_resolution.is_none() && profile.cutoff_quality.is_none() {
        return None;
    }

    let lookup = |category: QualityCategory, name: Option<&String>| -> Option<u32> {
        match name {
            None => Some(0),
            Some(name) => match taxonomy.by_name(category, name) {
                Some(item) => Some(item.id),
                None => {
                    warn!(profile = %profile.name, %category, name = %name, "unknown cutoff item");
                    None
                }
            },
        }
    };

    let res = lookup(QualityCategory::Resolution, profile.cutoff_resolution.as_ref())?;
    let qual = lookup(QualityCategory::Quality, profile.cutoff_quality.as_ref())?;
    table.all(PriorityKey::from_ids([res, qual, 0, 0]))
}
