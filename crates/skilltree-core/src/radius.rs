// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Jewel radius resolver.
use tracing::trace;

use crate::ident::NodeId;
use crate::item::Item;
use crate::realize::{NodeView, TreeData};

const RING_RADIUS: &str = "local_jewel_variable_ring_radius_value";
const ESCAPE_KEYSTONE: &str =
    "local_unique_jewel_disconnected_passives_can_be_allocated_around_keystone_hash";
const LEAP: &str = "local_unique_jewel_nearby_disconnected_passives_can_be_allocated";
const ALTERNATE_TREE_VERSION: &str = "local_unique_jewel_alternate_tree_version";

/// Inner radius of an escape radius around its keystone.
const ESCAPE_INNER_RADIUS: f64 = 144.0;

/// Circle or annulus around a socketed unique jewel.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusJewel<'a> {
    /// Socket holding the jewel.
    pub id: NodeId,
    /// The jewel.
    pub jewel: &'a Item,
    /// Center x (the socket, or the escape keystone).
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Inner radius squared.
    pub inner2: f64,
    /// Outer radius squared.
    pub outer2: f64,
    /// Alternate tree version of a timeless jewel.
    pub tree_version: Option<u32>,
}

impl RadiusJewel<'_> {
    /// Whether `node` is an ordinary passive inside the radius.
    ///
    /// Cluster nodes, sockets, immutable nodes, multiple-choice options and
    /// ascendancy nodes are never contained.
    pub fn contains(&self, node: &NodeView<'_>) -> bool {
        if node.cluster_node
            || node.skill.is_jewel_socket
            || node.immutable
            || node.skill.is_multiple_choice_option
            || node.skill.ascendancy.is_some()
        {
            return false;
        }
        let dx = node.x - self.x;
        let dy = node.y - self.y;
        let d2 = dx * dx + dy * dy;
        d2 >= self.inner2 && d2 <= self.outer2
    }
}

/// Radius of the unique jewel socketed in `id`.
///
/// With `leap_only`, only jewels that let nearby disconnected passives be
/// allocated resolve; escape radii always resolve.
pub fn radius_jewel<'a>(data: &TreeData<'a>, id: NodeId, leap_only: bool) -> Option<RadiusJewel<'a>> {
    let node = data.node(id)?;
    if node.cluster_node {
        return None;
    }
    let jewel = node.jewel?;
    let unique = jewel.unique.as_ref()?;
    let catalog = data.catalog();
    let tree_version = jewel.unique_stat(ALTERNATE_TREE_VERSION).map(|v| v as u32);
    let radius = catalog
        .uniques
        .get(unique)
        .and_then(|def| def.jewel_radius)
        .and_then(|index| catalog.jewel_radius(index));

    if let (Some(keystone), Some(radius)) = (jewel.unique_stat(ESCAPE_KEYSTONE), radius) {
        let anchor = data.node(keystone as NodeId)?;
        return Some(RadiusJewel {
            id,
            jewel,
            x: anchor.x,
            y: anchor.y,
            inner2: ESCAPE_INNER_RADIUS * ESCAPE_INNER_RADIUS,
            outer2: radius.radius * radius.radius,
            tree_version,
        });
    }

    if leap_only && jewel.unique_stat(LEAP).is_none() {
        return None;
    }

    if let Some(ring) = jewel.unique_stat(RING_RADIUS) {
        let Some(ring) = catalog.jewel_radius(ring as usize) else {
            trace!(socket = id, ring, "ring radius index not in the radius table");
            return None;
        };
        Some(RadiusJewel {
            id,
            jewel,
            x: node.x,
            y: node.y,
            inner2: ring.ring_inner * ring.ring_inner,
            outer2: ring.ring_outer * ring.ring_outer,
            tree_version,
        })
    } else {
        radius.map(|radius| RadiusJewel {
            id,
            jewel,
            x: node.x,
            y: node.y,
            inner2: 0.0,
            outer2: radius.radius * radius.radius,
            tree_version,
        })
    }
}
