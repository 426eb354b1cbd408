//! Phrenic pool resource rules.
//!
//! Pure, deterministic transition functions over [`CharacterState`].
//! Each successful transition produces an [`Effect`] describing what
//! changed, for the presentation layer to render. Precondition
//! violations come back as [`RulesError`] values and leave the state
//! untouched; nothing in here panics or touches storage.

use crate::catalog::{Item, ItemKind};
use crate::state::{CharacterState, MAX_LEVEL, MIN_LEVEL};
use serde::Serialize;
use thiserror::Error;

/// Why a use/cast was refused. Recoverable and user-visible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("requires level {required}, but the character is level {level}")]
    LevelTooLow { required: u8, level: u8 },

    #[error("needs {needed} phrenic pool point(s), but only {available} remain")]
    InsufficientPool { needed: u8, available: u8 },
}

/// What a successful transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// An ability spent pool points.
    AbilityUsed { cost: u8, pool: u8 },

    /// A spell was cast; `surcharge` is one point per amplification
    /// that was active, already netted out of the restore.
    SpellCast {
        restored: u8,
        surcharge: u8,
        pool: u8,
    },

    /// A power was used, spending its cost if it had one.
    PowerUsed { cost: u8, pool: u8 },

    /// A spell entered or left the activated set.
    SpellActivationToggled { spell_id: String, activated: bool },

    /// An amplification was toggled on or off.
    AmplificationToggled {
        amplification_id: String,
        active: bool,
    },

    /// The character level changed; the pool refills to the new capacity.
    LevelChanged { level: u8, pool: u8 },

    /// The pool was restored to capacity.
    PoolRestored { pool: u8 },
}

/// Maximum pool for a character level.
pub fn pool_capacity(level: u8) -> u8 {
    level / 3 + 3
}

/// Whether an item can be used right now.
///
/// The level gate applies to every kind. Beyond that: abilities and
/// costed powers need the pool to cover their cost; a spell needs the
/// pool to cover the amplification surcharge when any amplification is
/// active; toggling an amplification is always free.
pub fn is_available(item: &Item, level: u8, pool: u8, active_amplifications: u8) -> bool {
    if level < item.required_level {
        return false;
    }
    match &item.kind {
        ItemKind::Ability { cost } => pool >= *cost,
        ItemKind::Spell { .. } => {
            active_amplifications == 0 || pool >= active_amplifications
        }
        ItemKind::Power { cost, .. } => cost.map_or(true, |c| pool >= c),
        ItemKind::Amplification => true,
    }
}

/// Spend `cost` pool points on an ability.
///
/// Callers are expected to have checked [`is_available`]; this still
/// refuses to drive the pool negative.
pub fn use_ability(state: &mut CharacterState, cost: u8) -> Result<Effect, RulesError> {
    if state.phrenic_pool < cost {
        return Err(RulesError::InsufficientPool {
            needed: cost,
            available: state.phrenic_pool,
        });
    }
    state.phrenic_pool -= cost;
    Ok(Effect::AbilityUsed {
        cost,
        pool: state.phrenic_pool,
    })
}

/// Cast a spell, restoring pool points.
///
/// Each active amplification charges one point, taken out of the
/// restored amount; the result is clamped to capacity and the active
/// amplification set is cleared.
pub fn cast_spell(state: &mut CharacterState, spell: &Item) -> Result<Effect, RulesError> {
    let restored = match &spell.kind {
        ItemKind::Spell { restore_amount, .. } => *restore_amount,
        _ => 0,
    };

    if state.level < spell.required_level {
        return Err(RulesError::LevelTooLow {
            required: spell.required_level,
            level: state.level,
        });
    }

    let surcharge = state.amplification_count();
    if state.phrenic_pool < surcharge {
        return Err(RulesError::InsufficientPool {
            needed: surcharge,
            available: state.phrenic_pool,
        });
    }

    let capacity = pool_capacity(state.level);
    state.phrenic_pool = (state.phrenic_pool + restored)
        .saturating_sub(surcharge)
        .min(capacity);
    state.active_amplifications.clear();

    Ok(Effect::SpellCast {
        restored,
        surcharge,
        pool: state.phrenic_pool,
    })
}

/// Use a power. Free unless the power carries an explicit cost.
pub fn use_power(state: &mut CharacterState, power: &Item) -> Result<Effect, RulesError> {
    if state.level < power.required_level {
        return Err(RulesError::LevelTooLow {
            required: power.required_level,
            level: state.level,
        });
    }

    let cost = match &power.kind {
        ItemKind::Power { cost, .. } => cost.unwrap_or(0),
        _ => 0,
    };
    if state.phrenic_pool < cost {
        return Err(RulesError::InsufficientPool {
            needed: cost,
            available: state.phrenic_pool,
        });
    }
    state.phrenic_pool -= cost;

    Ok(Effect::PowerUsed {
        cost,
        pool: state.phrenic_pool,
    })
}

/// Flip a spell's membership in the activated set. Always succeeds.
pub fn toggle_spell_activation(state: &mut CharacterState, spell_id: &str) -> Effect {
    let activated = if state.activated_spells.remove(spell_id) {
        false
    } else {
        state.activated_spells.insert(spell_id.to_string());
        true
    };
    Effect::SpellActivationToggled {
        spell_id: spell_id.to_string(),
        activated,
    }
}

/// Flip an amplification's membership in the active set. Always succeeds.
pub fn toggle_amplification(state: &mut CharacterState, amplification_id: &str) -> Effect {
    let active = if state.active_amplifications.remove(amplification_id) {
        false
    } else {
        state
            .active_amplifications
            .insert(amplification_id.to_string());
        true
    };
    Effect::AmplificationToggled {
        amplification_id: amplification_id.to_string(),
        active,
    }
}

/// Change the character level by `delta`, clamped to `[1, 20]`.
///
/// A level change always refills the pool to the new capacity, even
/// when the level goes down.
pub fn change_level(state: &mut CharacterState, delta: i8) -> Effect {
    let level = (state.level as i16 + delta as i16)
        .clamp(MIN_LEVEL as i16, MAX_LEVEL as i16) as u8;
    state.level = level;
    state.phrenic_pool = pool_capacity(level);
    Effect::LevelChanged {
        level,
        pool: state.phrenic_pool,
    }
}

/// Refill the pool to capacity and clear active amplifications.
pub fn restore_pool(state: &mut CharacterState) -> Effect {
    state.phrenic_pool = pool_capacity(state.level);
    state.active_amplifications.clear();
    Effect::PoolRestored {
        pool: state.phrenic_pool,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_item;

    fn state_at(level: u8, pool: u8) -> CharacterState {
        CharacterState {
            level,
            phrenic_pool: pool,
            ..CharacterState::new()
        }
    }

    #[test]
    fn test_pool_capacity_formula() {
        assert_eq!(pool_capacity(1), 3);
        assert_eq!(pool_capacity(2), 3);
        assert_eq!(pool_capacity(3), 4);
        assert_eq!(pool_capacity(5), 4);
        assert_eq!(pool_capacity(6), 5);
        assert_eq!(pool_capacity(9), 6);
        assert_eq!(pool_capacity(12), 7);
        assert_eq!(pool_capacity(20), 9);
    }

    #[test]
    fn test_pool_capacity_is_monotonic() {
        for level in MIN_LEVEL..MAX_LEVEL {
            assert!(pool_capacity(level) <= pool_capacity(level + 1));
        }
    }

    #[test]
    fn test_use_ability_spends_pool() {
        let mut state = state_at(3, 4);
        let effect = use_ability(&mut state, 2).unwrap();
        assert_eq!(effect, Effect::AbilityUsed { cost: 2, pool: 2 });
        assert_eq!(state.phrenic_pool, 2);
    }

    #[test]
    fn test_use_ability_refuses_to_go_negative() {
        let mut state = state_at(1, 1);
        let err = use_ability(&mut state, 2).unwrap_err();
        assert_eq!(
            err,
            RulesError::InsufficientPool {
                needed: 2,
                available: 1
            }
        );
        assert_eq!(state.phrenic_pool, 1); // unchanged
    }

    #[test]
    fn test_cast_spell_restores_up_to_capacity() {
        // Level 5: capacity 4. Pool 2 + restore 3 clamps to 4.
        let spell = find_item("spell-dream-messenger").unwrap();
        let mut state = state_at(5, 2);
        let effect = cast_spell(&mut state, spell).unwrap();
        assert_eq!(
            effect,
            Effect::SpellCast {
                restored: 3,
                surcharge: 0,
                pool: 4
            }
        );
    }

    #[test]
    fn test_cast_spell_level_gate() {
        let spell = find_item("spell-oneiromancy").unwrap(); // level 9
        let mut state = state_at(5, 4);
        let err = cast_spell(&mut state, spell).unwrap_err();
        assert_eq!(
            err,
            RulesError::LevelTooLow {
                required: 9,
                level: 5
            }
        );
        assert_eq!(state.phrenic_pool, 4);
    }

    #[test]
    fn test_cast_spell_nets_out_amplification_surcharge() {
        // Level 9: capacity 6. Pool 5 + restore 2 - surcharge 1 = 6.
        let spell = find_item("spell-nightmare").unwrap();
        let mut state = state_at(9, 5);
        state
            .active_amplifications
            .insert("amplification-focused-reverie".to_string());

        let effect = cast_spell(&mut state, spell).unwrap();
        assert_eq!(
            effect,
            Effect::SpellCast {
                restored: 2,
                surcharge: 1,
                pool: 6
            }
        );
        assert!(state.active_amplifications.is_empty());
    }

    #[test]
    fn test_cast_spell_requires_pool_to_cover_surcharge() {
        let spell = find_item("spell-dream-scan").unwrap();
        let mut state = state_at(3, 0);
        state
            .active_amplifications
            .insert("amplification-focused-reverie".to_string());

        let err = cast_spell(&mut state, spell).unwrap_err();
        assert_eq!(
            err,
            RulesError::InsufficientPool {
                needed: 1,
                available: 0
            }
        );
        // A refused cast keeps the amplifications armed.
        assert_eq!(state.amplification_count(), 1);
    }

    #[test]
    fn test_use_power_has_no_pool_effect_without_cost() {
        let power = find_item("power-sleep").unwrap();
        let mut state = state_at(4, 2);
        let effect = use_power(&mut state, power).unwrap();
        assert_eq!(effect, Effect::PowerUsed { cost: 0, pool: 2 });
    }

    #[test]
    fn test_use_power_spends_explicit_cost() {
        let power = Item::power("power-test", "Test", "Costed power", 1, 1).with_cost(2);
        let mut state = state_at(1, 3);
        let effect = use_power(&mut state, &power).unwrap();
        assert_eq!(effect, Effect::PowerUsed { cost: 2, pool: 1 });

        let mut broke = state_at(1, 1);
        assert!(use_power(&mut broke, &power).is_err());
        assert_eq!(broke.phrenic_pool, 1);
    }

    #[test]
    fn test_use_power_level_gate() {
        let power = find_item("power-waking-dream").unwrap(); // level 9
        let mut state = state_at(8, 5);
        assert_eq!(
            use_power(&mut state, power).unwrap_err(),
            RulesError::LevelTooLow {
                required: 9,
                level: 8
            }
        );
    }

    #[test]
    fn test_toggle_pairs_are_idempotent() {
        let mut state = CharacterState::new();

        toggle_spell_activation(&mut state, "spell-nightmare");
        assert!(state.activated_spells.contains("spell-nightmare"));
        toggle_spell_activation(&mut state, "spell-nightmare");
        assert!(state.activated_spells.is_empty());

        toggle_amplification(&mut state, "amplification-deep-trance");
        assert_eq!(state.amplification_count(), 1);
        toggle_amplification(&mut state, "amplification-deep-trance");
        assert_eq!(state.amplification_count(), 0);
    }

    #[test]
    fn test_change_level_refills_pool() {
        let mut state = state_at(1, 2);
        let effect = change_level(&mut state, 1);
        assert_eq!(effect, Effect::LevelChanged { level: 2, pool: 3 });

        // Refills even when leveling down.
        let mut state = state_at(9, 0);
        let effect = change_level(&mut state, -1);
        assert_eq!(effect, Effect::LevelChanged { level: 8, pool: 5 });
    }

    #[test]
    fn test_change_level_clamps_to_bounds() {
        let mut state = state_at(1, 3);
        change_level(&mut state, -5);
        assert_eq!(state.level, 1);

        let mut state = state_at(20, 9);
        change_level(&mut state, 3);
        assert_eq!(state.level, 20);
        assert_eq!(state.phrenic_pool, 9);
    }

    #[test]
    fn test_restore_pool_refills_and_disarms() {
        let mut state = state_at(6, 0);
        state
            .active_amplifications
            .insert("amplification-lucid-surge".to_string());

        let effect = restore_pool(&mut state);
        assert_eq!(effect, Effect::PoolRestored { pool: 5 });
        assert!(state.active_amplifications.is_empty());
    }

    #[test]
    fn test_is_available_branches() {
        let ability = find_item("ability-dream-tinkerer").unwrap(); // level 3, cost 2
        assert!(!is_available(ability, 2, 4, 0)); // level gate
        assert!(!is_available(ability, 3, 1, 0)); // pool gate
        assert!(is_available(ability, 3, 2, 0));

        let spell = find_item("spell-dream-scan").unwrap();
        assert!(is_available(spell, 1, 0, 0)); // plain cast is free
        assert!(!is_available(spell, 1, 0, 1)); // surcharge unaffordable
        assert!(is_available(spell, 1, 2, 2));

        let amplification = find_item("amplification-focused-reverie").unwrap();
        assert!(is_available(amplification, 1, 0, 0)); // free with an empty pool
        let high = find_item("amplification-deep-trance").unwrap();
        assert!(!is_available(high, 4, 4, 0)); // level gate still applies

        let power = find_item("power-lullaby").unwrap();
        assert!(is_available(power, 1, 0, 0)); // costless
    }

    #[test]
    fn test_pool_invariant_holds_across_transitions() {
        let mut state = CharacterState::new();
        for delta in [5i8, 7, -3, 12, -20, 4] {
            change_level(&mut state, delta);
            assert!(state.phrenic_pool <= pool_capacity(state.level));
        }
        let spell = find_item("spell-dream-leech").unwrap();
        change_level(&mut state, 19); // to 20
        cast_spell(&mut state, spell).unwrap();
        assert!(state.phrenic_pool <= pool_capacity(state.level));
    }
}
