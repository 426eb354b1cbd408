//! Character state: the single mutable aggregate the tracker owns.

use crate::catalog::{self, ItemKind};
use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lowest character level.
pub const MIN_LEVEL: u8 = 1;

/// Highest character level.
pub const MAX_LEVEL: u8 = 20;

/// Everything that persists about the character between sessions.
///
/// Invariant: `phrenic_pool` never exceeds the capacity for `level`,
/// and ids in the two sets reference catalog entries of the matching
/// kind. [`CharacterState::sanitize`] restores both after loading
/// untrusted data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    /// Character level, in `[MIN_LEVEL, MAX_LEVEL]`.
    pub level: u8,

    /// Current phrenic pool, in `[0, capacity(level)]`.
    pub phrenic_pool: u8,

    /// Spells the player has toggled on; only these are eligible for use.
    pub activated_spells: HashSet<String>,

    /// Amplifications toggled on for the next spell cast.
    pub active_amplifications: HashSet<String>,
}

impl CharacterState {
    /// A fresh level-1 character with a full pool and nothing activated.
    pub fn new() -> Self {
        Self {
            level: MIN_LEVEL,
            phrenic_pool: rules::pool_capacity(MIN_LEVEL),
            activated_spells: HashSet::new(),
            active_amplifications: HashSet::new(),
        }
    }

    /// Maximum pool at the current level.
    pub fn pool_capacity(&self) -> u8 {
        rules::pool_capacity(self.level)
    }

    /// Number of amplifications toggled on.
    pub fn amplification_count(&self) -> u8 {
        self.active_amplifications.len() as u8
    }

    /// Clamp numeric fields into range and drop ids that don't name a
    /// catalog entry of the right kind. Loaded state passes through here
    /// before it is trusted.
    pub fn sanitize(&mut self) {
        self.level = self.level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.phrenic_pool = self.phrenic_pool.min(self.pool_capacity());
        self.activated_spells.retain(|id| {
            matches!(
                catalog::find_item(id).map(|item| &item.kind),
                Some(ItemKind::Spell { .. })
            )
        });
        self.active_amplifications.retain(|id| {
            matches!(
                catalog::find_item(id).map(|item| &item.kind),
                Some(ItemKind::Amplification)
            )
        });
    }
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character_defaults() {
        let state = CharacterState::new();
        assert_eq!(state.level, 1);
        assert_eq!(state.phrenic_pool, 3); // capacity(1) = 1/3 + 3
        assert!(state.activated_spells.is_empty());
        assert!(state.active_amplifications.is_empty());
    }

    #[test]
    fn test_sanitize_clamps_level_and_pool() {
        let mut state = CharacterState {
            level: 42,
            phrenic_pool: 200,
            ..CharacterState::new()
        };
        state.sanitize();
        assert_eq!(state.level, 20);
        assert_eq!(state.phrenic_pool, 9); // capacity(20) = 20/3 + 3
    }

    #[test]
    fn test_sanitize_drops_unknown_and_wrong_kind_ids() {
        let mut state = CharacterState::new();
        state.activated_spells.insert("spell-nightmare".to_string());
        state.activated_spells.insert("no-such-spell".to_string());
        state.activated_spells.insert("power-lullaby".to_string()); // wrong kind
        state
            .active_amplifications
            .insert("amplification-lucid-surge".to_string());
        state
            .active_amplifications
            .insert("spell-nightmare".to_string()); // wrong kind

        state.sanitize();

        assert_eq!(state.activated_spells.len(), 1);
        assert!(state.activated_spells.contains("spell-nightmare"));
        assert_eq!(state.active_amplifications.len(), 1);
        assert!(state
            .active_amplifications
            .contains("amplification-lucid-surge"));
    }
}
