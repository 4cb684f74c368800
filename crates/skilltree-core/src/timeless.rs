// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Timeless jewel rerolls.
//!
//! Every node in a timeless jewel's radius is rerolled from a generator
//! seeded with `(node id, jewel seed)`, so the outcome for a node never
//! depends on which other nodes were rerolled first.
use crate::catalog::{AlternatePassiveSkill, Catalog, SkillDefinition, StatRange};
use crate::ident::NodeId;
use crate::item::Item;
use crate::math::RerollRng;
use crate::stats::Stats;

const TREE_VERSION: &str = "local_unique_jewel_alternate_tree_version";
const TREE_SEED: &str = "local_unique_jewel_alternate_tree_seed";
const TREE_KEYSTONE: &str = "local_unique_jewel_alternate_tree_keystone";
const TREE_REVISION: &str = "local_unique_jewel_alternate_tree_internal_revision";

const TYPE_ATTRIBUTE: u32 = 1;
const TYPE_SMALL: u32 = 2;
const TYPE_NOTABLE: u32 = 4;
const TYPE_KEYSTONE: u32 = 8;

const ATTRIBUTE_STATS: [&str; 3] = ["base_strength", "base_dexterity", "base_intelligence"];

/// Reroll parameters carried by a timeless jewel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimelessSeed {
    /// Alternate tree version.
    pub version: u32,
    /// Jewel seed.
    pub seed: u32,
    /// Keystone tag the jewel grants.
    pub keystone: Option<u32>,
    /// Internal revision of the keystone.
    pub revision: Option<u32>,
}

impl TimelessSeed {
    /// Reads the reroll parameters from a jewel's unique stats.
    pub fn from_item(item: &Item) -> Option<Self> {
        let version = item.unique_stat(TREE_VERSION)? as u32;
        Some(Self {
            version,
            seed: item.unique_stat(TREE_SEED).unwrap_or(0.0) as u32,
            keystone: item.unique_stat(TREE_KEYSTONE).map(|v| v as u32),
            revision: item.unique_stat(TREE_REVISION).map(|v| v as u32),
        })
    }
}

fn roll_stats(rng: &mut RerollRng, stats: &[StatRange]) -> Stats {
    stats
        .iter()
        .map(|range| {
            let value = if range.max > range.min {
                rng.range(range.min, range.max)
            } else {
                range.max
            };
            (range.id.clone(), value as f64)
        })
        .collect()
}

fn create_skill(catalog: &Catalog, rng: &mut RerollRng, entry: &AlternatePassiveSkill) -> SkillDefinition {
    SkillDefinition {
        name: entry.name.clone(),
        icon: entry.icon.clone(),
        alternate: catalog
            .alternate_tree_versions
            .get(&entry.version)
            .map(|version| version.id.clone()),
        stats: roll_stats(rng, &entry.stats),
        flavour_text: entry.flavour_text.clone(),
        is_notable: entry.types & TYPE_NOTABLE != 0,
        is_keystone: entry.types & TYPE_KEYSTONE != 0,
        ..SkillDefinition::default()
    }
}

fn skill_type(skill: &SkillDefinition) -> u32 {
    if skill.is_keystone {
        return TYPE_KEYSTONE;
    }
    if skill.is_notable {
        return TYPE_NOTABLE;
    }
    let mut ids = skill.stats.keys();
    match (ids.next(), ids.next()) {
        (Some(only), None) if ATTRIBUTE_STATS.contains(&only.as_str()) => TYPE_ATTRIBUTE,
        _ => TYPE_SMALL,
    }
}

/// Rerolls `skill` (the node's current skill, `original` its catalog skill)
/// under the timeless jewel parameters `seed`.
pub fn mutate_timeless(
    catalog: &Catalog,
    id: NodeId,
    skill: &SkillDefinition,
    original: &SkillDefinition,
    seed: &TimelessSeed,
) -> SkillDefinition {
    let Some(tree) = catalog.alternate_tree_versions.get(&seed.version) else {
        return skill.clone();
    };
    let mut rng = RerollRng::new(&[id, seed.seed]);
    let entries = || {
        catalog
            .alternate_passive_skills
            .iter()
            .filter(|entry| entry.version == seed.version)
    };

    if skill.is_keystone {
        let entry = entries()
            .find(|entry| entry.keystone == seed.keystone && entry.revision == seed.revision)
            .or_else(|| entries().find(|entry| entry.keystone == seed.keystone));
        return entry.map_or_else(|| skill.clone(), |entry| create_skill(catalog, &mut rng, entry));
    }

    let kind = skill_type(original);
    let replace = if skill.is_notable {
        let roll = rng.range(0, 100);
        tree.replace_notable_weight >= 100 || roll < i64::from(tree.replace_notable_weight)
    } else if kind == TYPE_ATTRIBUTE {
        tree.replace_small_attributes
    } else {
        tree.replace_small_normal
    };

    let (mut random_min, mut random_max) = (tree.random_min, tree.random_max);
    let mut result = None;
    if replace {
        let mut candidate = None;
        let mut weight = 0u32;
        for entry in entries().filter(|entry| entry.types & kind != 0) {
            weight = weight.wrapping_add(entry.weight);
            if rng.modulo(weight) < entry.weight {
                candidate = Some(entry);
            }
        }
        if let Some(candidate) = candidate {
            result = Some(create_skill(catalog, &mut rng, candidate));
            random_min = candidate.random_min;
            random_max = candidate.random_max;
        }
    }
    let mut result = result.unwrap_or_else(|| skill.clone());

    let random = if random_max > random_min {
        rng.range(i64::from(random_min), i64::from(random_max))
    } else {
        i64::from(random_max)
    };
    if random <= 0 {
        return result;
    }
    result.base_stats = Some(result.stats.clone());

    let additions: Vec<_> = catalog
        .alternate_passive_additions
        .iter()
        .filter(|row| row.version == seed.version && row.types & kind != 0)
        .collect();
    let total_weight = additions.iter().fold(0u32, |sum, row| sum.wrapping_add(row.weight));
    for _ in 0..random {
        let mut roll = rng.modulo(total_weight);
        let mut picked = None;
        for row in &additions {
            picked = Some(*row);
            if roll < row.weight {
                break;
            }
            roll -= row.weight;
        }
        if let Some(row) = picked {
            for (stat, value) in roll_stats(&mut rng, &row.stats) {
                *result.stats.entry(stat).or_insert(0.0) += value;
            }
        }
    }
    result
}

/// Rerolls the catalog skill of `id` for a jewel with `seed`.
pub fn timeless_reroll(
    catalog: &Catalog,
    id: NodeId,
    seed: &TimelessSeed,
    skill: &SkillDefinition,
) -> SkillDefinition {
    mutate_timeless(catalog, id, skill, skill, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AlternateTreeVersion;

    fn stats(entries: &[(&str, f64)]) -> Stats {
        entries.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn attribute_smalls_are_classified_separately() {
        let attribute = SkillDefinition {
            stats: stats(&[("base_dexterity", 10.0)]),
            ..SkillDefinition::default()
        };
        let small = SkillDefinition {
            stats: stats(&[("base_dexterity", 10.0), ("life", 5.0)]),
            ..SkillDefinition::default()
        };
        assert_eq!(skill_type(&attribute), TYPE_ATTRIBUTE);
        assert_eq!(skill_type(&small), TYPE_SMALL);
    }

    #[test]
    fn unknown_tree_version_keeps_the_skill() {
        let skill = SkillDefinition {
            name: "Keep".into(),
            ..SkillDefinition::default()
        };
        let seed = TimelessSeed {
            version: 9,
            seed: 1,
            ..TimelessSeed::default()
        };
        assert_eq!(timeless_reroll(&Catalog::default(), 1, &seed, &skill), skill);
    }

    #[test]
    fn keystone_falls_back_to_revisionless_entry() {
        let mut catalog = Catalog::default();
        catalog.alternate_tree_versions.insert(
            1,
            AlternateTreeVersion {
                id: "vaal".into(),
                ..AlternateTreeVersion::default()
            },
        );
        catalog.alternate_passive_skills.push(AlternatePassiveSkill {
            version: 1,
            name: "Corrupted Soul".into(),
            types: TYPE_KEYSTONE,
            keystone: Some(3),
            revision: None,
            stats: vec![StatRange {
                id: "k".into(),
                min: 1,
                max: 1,
            }],
            ..AlternatePassiveSkill::default()
        });
        let keystone = SkillDefinition {
            is_keystone: true,
            ..SkillDefinition::default()
        };
        let seed = TimelessSeed {
            version: 1,
            seed: 77,
            keystone: Some(3),
            revision: Some(2),
        };
        let rolled = timeless_reroll(&catalog, 10, &seed, &keystone);
        assert_eq!(rolled.name, "Corrupted Soul");
        assert!(rolled.is_keystone);
        assert_eq!(rolled.alternate.as_deref(), Some("vaal"));
        assert_eq!(rolled.stats, stats(&[("k", 1.0)]));
    }
}
