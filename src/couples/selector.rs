//! Partner selection: weighted draw between a preferred partner and a
//! placeholder name.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use teloxide::types::UserId;

/// Who got matched with the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partner {
    /// A real user drawn from the requester's candidate list.
    Preferred(UserId),
    /// A stand-in name. There is nobody to fetch an avatar for.
    Placeholder(String),
}

/// Outcome of a single draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub partner: Partner,
    pub preferred: bool,
}

/// Draws partners for `/couples` requests.
///
/// The candidate table is built once at startup and never mutated, so the
/// selector is safe to share across concurrent requests.
pub struct PartnerSelector {
    pairs: HashMap<UserId, Vec<UserId>>,
    preferred_chance: f64,
    placeholder_names: Vec<String>,
}

impl PartnerSelector {
    pub fn new(
        pairs: HashMap<UserId, Vec<UserId>>,
        preferred_chance: f64,
        placeholder_names: Vec<String>,
    ) -> Self {
        Self { pairs, preferred_chance, placeholder_names }
    }

    /// Pick a partner for `requester`.
    ///
    /// If the requester has candidates and the uniform roll lands below the
    /// configured chance, one candidate is chosen uniformly and the pick is
    /// preferred. Every other requester (unknown ids included) falls through
    /// to a uniformly chosen placeholder name.
    pub fn select<R: Rng + ?Sized>(&self, requester: UserId, rng: &mut R) -> Selection {
        let roll = rng.r#gen::<f64>();
        self.select_with_roll(requester, roll, rng)
    }

    fn select_with_roll<R: Rng + ?Sized>(
        &self,
        requester: UserId,
        roll: f64,
        rng: &mut R,
    ) -> Selection {
        if roll < self.preferred_chance
            && let Some(candidates) = self.pairs.get(&requester)
            && let Some(partner) = candidates.choose(rng)
        {
            return Selection { partner: Partner::Preferred(*partner), preferred: true };
        }

        // Placeholder set is validated non-empty at config load.
        let name = self.placeholder_names.choose(rng).cloned().unwrap_or_default();
        Selection { partner: Partner::Placeholder(name), preferred: false }
    }
}
