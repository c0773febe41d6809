use std::fmt;

use serde::{Deserialize, Serialize};

/// The four quality dimensions a release is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityCategory {
    /// Vertical resolution: 2160p, 1080p, 720p …
    Resolution,
    /// Source quality: remux, bluray, webdl …
    Quality,
    /// Video codec: h265, h264, xvid …
    Codec,
    /// Audio format: truehd, dts, dd+ …
    Audio,
}

impl QualityCategory {
    /// All categories in table order.
    pub const ALL: [Self; 4] = [Self::Resolution, Self::Quality, Self::Codec, Self::Audio];

    /// Position of the category in every `[T; 4]` accessor table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Resolution => 0,
            Self::Quality => 1,
            Self::Codec => 2,
            Self::Audio => 3,
        }
    }

    /// Lower-case name used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::Quality => "quality",
            Self::Codec => "codec",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved category value of a release: the catalog name and its id.
///
/// `id == 0` is the "unknown" sentinel. A slot may carry a name with id 0
/// until the resolver fills the id in, or the other way round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySlot {
    /// Catalog item name, e.g. `"1080p"`.
    pub name: Option<String>,
    /// Catalog item id, 0 when unknown.
    pub id: u32,
}

impl QualitySlot {
    /// Returns `true` if neither a name nor an id is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.name.as_deref().is_none_or(str::is_empty)
    }

    /// Name as `&str`, empty when unknown.
    #[must_use]
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Accessor table holding one [`QualitySlot`] per [`QualityCategory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySet {
    slots: [QualitySlot; 4],
}

impl QualitySet {
    /// Returns the slot for `category`.
    #[must_use]
    pub fn get(&self, category: QualityCategory) -> &QualitySlot {
        &self.slots[category.index()]
    }

    /// Returns the slot for `category` mutably.
    pub fn get_mut(&mut self, category: QualityCategory) -> &mut QualitySlot {
        &mut self.slots[category.index()]
    }

    /// Sets both name and id for `category`.
    pub fn set(&mut self, category: QualityCategory, name: impl Into<String>, id: u32) {
        let slot = self.get_mut(category);
        slot.name = Some(name.into());
        slot.id = id;
    }

    /// Ids in table order, used as a priority lookup key.
    #[must_use]
    pub fn ids(&self) -> [u32; 4] {
        [
            self.slots[0].id,
            self.slots[1].id,
            self.slots[2].id,
            self.slots[3].id,
        ]
    }

    /// Iterates `(category, slot)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (QualityCategory, &QualitySlot)> {
        QualityCategory::ALL.into_iter().zip(self.slots.iter())
    }
}
