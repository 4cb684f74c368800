// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Socketed items as seen by the engine.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ident::ItemId;
use crate::stats::Stats;

/// Stat group holding unique-jewel parameters (radius, seeds, leap flags).
pub(crate) const UNIQUE_GROUP: &str = "unique";

/// A jewel (or any item) that can sit in a socket node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Base type id, keyed into [`Catalog::item_bases`](crate::Catalog).
    pub base: String,
    /// Unique id when the item is a unique, keyed into `Catalog::uniques`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<String>,
    /// Stat groups (`"unique"`, `"implicit"`, `"explicit"`, ...).
    #[serde(default)]
    pub stats: BTreeMap<String, Stats>,
    /// Crafted cluster-jewel parameters for non-unique cluster jewels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_jewel: Option<ClusterJewelRoll>,
}

/// Node count and small-passive skill chosen on a crafted cluster jewel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterJewelRoll {
    /// Number of passives the jewel adds.
    pub nodes: u32,
    /// Skill id of the small passives.
    pub skill: String,
}

impl Item {
    /// Returns a non-zero stat from the unique group.
    pub fn unique_stat(&self, id: &str) -> Option<f64> {
        self.stats
            .get(UNIQUE_GROUP)
            .and_then(|group| group.get(id))
            .copied()
            .filter(|value| *value != 0.0)
    }

    /// Sums every stat group into a single bag.
    pub fn merged_stats(&self) -> Stats {
        let mut total = Stats::new();
        crate::stats::stats_extend(&mut total, self.stats.values());
        total
    }
}

/// Read-only item lookup keyed by item id.
pub trait ItemStore {
    /// Resolves an item, or `None` when the id is unknown.
    fn item(&self, id: ItemId) -> Option<&Item>;
}

impl ItemStore for BTreeMap<ItemId, Item> {
    fn item(&self, id: ItemId) -> Option<&Item> {
        self.get(&id)
    }
}
