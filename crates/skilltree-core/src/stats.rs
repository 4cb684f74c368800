// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stat bags: effect id → magnitude.
use std::collections::BTreeMap;

/// Ordered stat mapping. Ordering keeps aggregate output stable.
pub type Stats = BTreeMap<String, f64>;

/// Adds every entry of each source into `target`, returning it for chaining.
pub fn stats_extend<'a, I>(target: &mut Stats, sources: I) -> &mut Stats
where
    I: IntoIterator<Item = &'a Stats>,
{
    for source in sources {
        for (id, value) in source {
            *target.entry(id.clone()).or_insert(0.0) += value;
        }
    }
    target
}

/// Returns a copy of `stats` with every magnitude multiplied by `factor`.
pub fn stats_scale(stats: &Stats, factor: f64) -> Stats {
    stats.iter().map(|(id, value)| (id.clone(), value * factor)).collect()
}
