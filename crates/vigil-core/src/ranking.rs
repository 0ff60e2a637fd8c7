//! Entity ranking for stable display.
//!
//! Orders the entity map's values by verification tier, then mention
//! volume. The sort is stable and the input map iterates in name order,
//! so ties keep a fixed relative order: re-rendering an unchanged
//! snapshot never visibly reshuffles rows.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::session::Entity;

/// Ranks entities for display: verified first, then by mention count
/// descending, ties in canonical-name order.
#[must_use]
pub fn rank_entities(entities: &BTreeMap<String, Entity>) -> Vec<&Entity> {
    let mut ranked: Vec<&Entity> = entities.values().collect();
    ranked.sort_by_key(|entity| {
        (
            entity.verification_status.priority(),
            Reverse(entity.mention_count),
        )
    });
    ranked
}
