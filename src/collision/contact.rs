use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::gjk::GjkResult;
use crate::utils::allocator::BodyHandle;

/// Packs two ids into one key: `(a << 16) | (b & 0xffff)`.
///
/// Used for contact features and as the compact hash of a body pair. Ids past
/// `0xffff` alias, so pair storage is keyed by [`PairKey`] instead.
pub fn pack_ids(a: u32, b: u32) -> u32 {
    (a << 16) | (b & 0xffff)
}

/// Both body ids of a pair, lower first.
pub type PairKey = (u32, u32);

pub fn pair_key(a: u32, b: u32) -> PairKey {
    (a.min(b), a.max(b))
}

/// Lifecycle of a [`CollisionPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionStage {
    #[default]
    None,
    Enter,
    Stay,
    Exit,
}

/// One contact point together with its solver state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactInfo {
    pub point: Vec2,
    /// Points from body A towards body B.
    pub normal: Vec2,
    pub penetration: f32,
    /// Correlates contacts across frames for warm starting.
    pub feature: u32,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub mass_normal: f32,
    pub mass_tangent: f32,
    pub bias: f32,
}

impl ContactInfo {
    /// Contact at A's deepest point along the EPA separation axis.
    pub fn from_gjk(result: &GjkResult) -> Option<Self> {
        let edge = result.edge?;
        Some(Self {
            point: result.closest_on_a,
            normal: edge.normal,
            penetration: edge.distance,
            feature: edge.feature_id(),
            ..Self::default()
        })
    }
}

/// Persistent record for two touching bodies, `body_a` having the lower id.
#[derive(Debug, Clone)]
pub struct CollisionPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub stage: CollisionStage,
    pub contacts: Vec<ContactInfo>,
    pub is_trigger: bool,
    /// World update that last confirmed the overlap.
    pub update_index: u64,
}

impl CollisionPair {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            stage: CollisionStage::None,
            contacts: Vec::new(),
            is_trigger: false,
            update_index: 0,
        }
    }

    /// Replaces the contacts, carrying accumulated impulses over from any old
    /// contact with the same feature.
    pub fn refresh_contacts(&mut self, mut fresh: Vec<ContactInfo>) {
        for contact in &mut fresh {
            if let Some(old) = self.contacts.iter().find(|c| c.feature == contact.feature) {
                contact.normal_impulse = old.normal_impulse;
                contact.tangent_impulse = old.tangent_impulse;
            }
        }
        self.contacts = fresh;
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }
}

/// Contact data handed to a collision listener, seen from one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// The other body.
    pub other: BodyHandle,
    pub point: Vec2,
    /// Points away from the receiving body.
    pub normal: Vec2,
    /// Writable: the value left here is used for this frame's resolution.
    pub penetration: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(feature: u32) -> ContactInfo {
        ContactInfo {
            feature,
            penetration: 0.1,
            ..ContactInfo::default()
        }
    }

    #[test]
    fn pack_ids_matches_layout() {
        assert_eq!(pack_ids(1, 2), 0x0001_0002);
        assert_eq!(pack_ids(3, 0x1_0005), 0x0003_0005);
    }

    #[test]
    fn pair_keys_do_not_alias_past_sixteen_bits() {
        assert_eq!(pack_ids(1, 2), pack_ids(1, 0x1_0002));
        assert_ne!(pair_key(1, 2), pair_key(1, 0x1_0002));
        assert_eq!(pair_key(9, 4), pair_key(4, 9));
    }

    #[test]
    fn refresh_carries_impulses_for_matching_features() {
        let mut pair = CollisionPair::new(BodyHandle::new(0, 0), BodyHandle::new(1, 0));
        let mut old = contact(7);
        old.normal_impulse = 2.0;
        old.tangent_impulse = -0.5;
        pair.contacts = vec![old, contact(9)];

        pair.refresh_contacts(vec![contact(7), contact(8)]);
        assert_eq!(pair.contacts.len(), 2);
        assert_eq!(pair.contacts[0].normal_impulse, 2.0);
        assert_eq!(pair.contacts[0].tangent_impulse, -0.5);
        assert_eq!(pair.contacts[1].normal_impulse, 0.0);
    }
}
